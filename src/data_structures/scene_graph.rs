//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] owns every scene object in a slot map. Objects form a forest
//! through parent/child links and carry a transform relative to their parent.
//! The built-in components (camera, light, renderable) are stored inline;
//! behaviours implementing [`Component`] are boxed and driven once per frame
//! by [`Scene::update`].

use anyhow::{anyhow, bail};
use cgmath::{InnerSpace, Point3, Quaternion, Vector3};
use log::{debug, warn};
use slotmap::{SlotMap, new_key_type};

use crate::{
    camera::{Camera, RenderTarget},
    data_structures::transform::Transform,
    input::VirtualInput,
    light::Light,
    resources::{MaterialHandle, MeshHandle},
    time::FrameTime,
};

new_key_type! {
    pub struct SceneObjectId;
}

/// Mesh plus material drawn at the owning object's world transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderable {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

/// User behaviour attached to a scene object.
///
/// The component is detached from its object while a hook runs, so it may
/// freely mutate the scene, including its own object.
pub trait Component {
    /// Called once, right after the component is attached.
    fn on_initialized(&mut self, _scene: &mut Scene, _id: SceneObjectId) {}

    /// Called once per frame by [`Scene::update`].
    fn update(&mut self, scene: &mut Scene, id: SceneObjectId, input: &VirtualInput, time: &FrameTime);

    /// Called when the owning object is destroyed.
    fn on_destroyed(&mut self, _id: SceneObjectId) {}
}

pub struct SceneObject {
    name: String,
    parent: Option<SceneObjectId>,
    children: Vec<SceneObjectId>,
    local: Transform,
    camera: Option<Camera>,
    light: Option<Light>,
    renderable: Option<Renderable>,
    components: Vec<Box<dyn Component>>,
}

impl SceneObject {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parent: None,
            children: Vec::new(),
            local: Transform::new(),
            camera: None,
            light: None,
            renderable: None,
            components: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<SceneObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[SceneObjectId] {
        &self.children
    }

    pub fn local_transform(&self) -> &Transform {
        &self.local
    }
}

impl std::fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneObject")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("local", &self.local)
            .field("camera", &self.camera.is_some())
            .field("light", &self.light.is_some())
            .field("renderable", &self.renderable)
            .field("components", &self.components.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    objects: SlotMap<SceneObjectId, SceneObject>,
    /// Objects that carry a camera, in the order the cameras were attached.
    cameras: Vec<SceneObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str) -> SceneObjectId {
        let id = self.objects.insert(SceneObject::new(name));
        debug!("Created scene object {name} ({id:?})");
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: SceneObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn get(&self, id: SceneObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    /// First object called `name`, in no particular order.
    pub fn find(&self, name: &str) -> Option<SceneObjectId> {
        self.objects
            .iter()
            .find_map(|(id, obj)| (obj.name == name).then_some(id))
    }

    fn object(&self, id: SceneObjectId) -> anyhow::Result<&SceneObject> {
        self.objects
            .get(id)
            .ok_or_else(|| anyhow!("Unknown scene object {id:?}"))
    }

    fn object_mut(&mut self, id: SceneObjectId) -> anyhow::Result<&mut SceneObject> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| anyhow!("Unknown scene object {id:?}"))
    }

    /// Re-parent `child`, or make it a root with `None`. The child keeps its
    /// world transform.
    pub fn set_parent(
        &mut self,
        child: SceneObjectId,
        parent: Option<SceneObjectId>,
    ) -> anyhow::Result<()> {
        self.object(child)?;
        if let Some(parent) = parent {
            self.object(parent)?;
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                if ancestor == child {
                    bail!("Parenting {child:?} to {parent:?} would create a cycle");
                }
                cursor = self.objects[ancestor].parent;
            }
        }

        let world = self.world_transform(child)?;
        if let Some(old) = self.objects[child].parent {
            if let Some(old) = self.objects.get_mut(old) {
                old.children.retain(|&c| c != child);
            }
        }

        let local = match parent {
            Some(parent) => {
                let parent_world = self.world_transform(parent)?;
                self.objects[parent].children.push(child);
                parent_world.inverse() * world
            }
            None => world,
        };
        let obj = &mut self.objects[child];
        obj.parent = parent;
        obj.local = local;
        Ok(())
    }

    pub fn local_transform(&self, id: SceneObjectId) -> anyhow::Result<Transform> {
        Ok(self.object(id)?.local)
    }

    pub fn set_local_transform(&mut self, id: SceneObjectId, transform: Transform) -> anyhow::Result<()> {
        self.object_mut(id)?.local = transform;
        Ok(())
    }

    pub fn set_position(&mut self, id: SceneObjectId, position: Vector3<f32>) -> anyhow::Result<()> {
        self.object_mut(id)?.local.position = position;
        Ok(())
    }

    pub fn set_rotation(&mut self, id: SceneObjectId, rotation: Quaternion<f32>) -> anyhow::Result<()> {
        self.object_mut(id)?.local.rotation = rotation.normalize();
        Ok(())
    }

    pub fn set_scale(&mut self, id: SceneObjectId, scale: Vector3<f32>) -> anyhow::Result<()> {
        self.object_mut(id)?.local.scale = scale;
        Ok(())
    }

    /// Composed transform from the root down to `id`.
    pub fn world_transform(&self, id: SceneObjectId) -> anyhow::Result<Transform> {
        let obj = self.object(id)?;
        let mut world = obj.local;
        let mut cursor = obj.parent;
        while let Some(parent) = cursor {
            let parent = self.object(parent)?;
            world = parent.local * world;
            cursor = parent.parent;
        }
        Ok(world)
    }

    fn parent_world(&self, id: SceneObjectId) -> anyhow::Result<Option<Transform>> {
        match self.object(id)?.parent {
            Some(parent) => Ok(Some(self.world_transform(parent)?)),
            None => Ok(None),
        }
    }

    /// Translate `id` by `delta` expressed in world space.
    pub fn move_by(&mut self, id: SceneObjectId, delta: Vector3<f32>) -> anyhow::Result<()> {
        let local_delta = match self.parent_world(id)? {
            Some(parent) => {
                let unrotated = parent.rotation.normalize().conjugate() * delta;
                Vector3::new(
                    unrotated.x / parent.scale.x,
                    unrotated.y / parent.scale.y,
                    unrotated.z / parent.scale.z,
                )
            }
            None => delta,
        };
        self.object_mut(id)?.local.translate(local_delta);
        Ok(())
    }

    /// Rotate `id` so that its forward axis points at the world-space `target`.
    pub fn look_at(
        &mut self,
        id: SceneObjectId,
        target: Point3<f32>,
        up: Vector3<f32>,
    ) -> anyhow::Result<()> {
        let mut world = self.world_transform(id)?;
        world.look_at(target, up);
        let rotation = match self.parent_world(id)? {
            Some(parent) => parent.rotation.normalize().conjugate() * world.rotation,
            None => world.rotation,
        };
        self.object_mut(id)?.local.rotation = rotation.normalize();
        Ok(())
    }

    /// Remove `id` with all of its descendants. Components of removed objects
    /// get [`Component::on_destroyed`].
    pub fn destroy(&mut self, id: SceneObjectId) -> anyhow::Result<()> {
        let parent = self.object(id)?.parent;
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(p)) {
            parent.children.retain(|&c| c != id);
        }

        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(obj) = self.objects.remove(next) else {
                continue;
            };
            debug!("Destroyed scene object {} ({next:?})", obj.name);
            stack.extend(obj.children.iter().copied());
            for mut component in obj.components {
                component.on_destroyed(next);
            }
        }
        let objects = &self.objects;
        self.cameras.retain(|&c| objects.contains_key(c));
        Ok(())
    }

    /// Attach `component` to `id` and run its [`Component::on_initialized`].
    pub fn add_component<C: Component + 'static>(
        &mut self,
        id: SceneObjectId,
        component: C,
    ) -> anyhow::Result<()> {
        self.object(id)?;
        let mut component: Box<dyn Component> = Box::new(component);
        component.on_initialized(self, id);
        match self.objects.get_mut(id) {
            Some(obj) => obj.components.push(component),
            None => warn!("Scene object {id:?} was destroyed while initializing a component"),
        }
        Ok(())
    }

    /// Run every component's per-frame update.
    pub fn update(&mut self, input: &VirtualInput, time: &FrameTime) {
        let ids: Vec<_> = self.objects.keys().collect();
        for id in ids {
            let Some(obj) = self.objects.get_mut(id) else {
                continue;
            };
            let mut components = std::mem::take(&mut obj.components);
            for component in &mut components {
                component.update(self, id, input, time);
            }
            match self.objects.get_mut(id) {
                Some(obj) => {
                    // Keep components attached while this object was updating
                    components.append(&mut obj.components);
                    obj.components = components;
                }
                None => {
                    for mut component in components {
                        component.on_destroyed(id);
                    }
                }
            }
        }
    }

    pub fn set_camera(&mut self, id: SceneObjectId, camera: Camera) -> anyhow::Result<()> {
        let obj = self.object_mut(id)?;
        let attached = obj.camera.replace(camera).is_none();
        if attached {
            self.cameras.push(id);
        }
        Ok(())
    }

    pub fn camera(&self, id: SceneObjectId) -> Option<&Camera> {
        self.objects.get(id)?.camera.as_ref()
    }

    pub fn camera_mut(&mut self, id: SceneObjectId) -> Option<&mut Camera> {
        self.objects.get_mut(id)?.camera.as_mut()
    }

    /// The first attached camera that renders to a target.
    pub fn main_camera(&self) -> Option<SceneObjectId> {
        self.cameras.iter().copied().find(|&id| {
            self.camera(id)
                .is_some_and(|camera| camera.viewport().target().is_some())
        })
    }

    /// Update the aspect ratio of every camera rendering to the primary window.
    pub fn set_window_aspect(&mut self, aspect_ratio: f32) {
        for &id in &self.cameras {
            if let Some(camera) = self.objects.get_mut(id).and_then(|o| o.camera.as_mut()) {
                if camera.viewport().target() == Some(RenderTarget::PrimaryWindow) {
                    camera.set_aspect_ratio(aspect_ratio);
                }
            }
        }
    }

    pub fn set_light(&mut self, id: SceneObjectId, light: Light) -> anyhow::Result<()> {
        self.object_mut(id)?.light = Some(light);
        Ok(())
    }

    pub fn light(&self, id: SceneObjectId) -> Option<&Light> {
        self.objects.get(id)?.light.as_ref()
    }

    pub fn light_mut(&mut self, id: SceneObjectId) -> Option<&mut Light> {
        self.objects.get_mut(id)?.light.as_mut()
    }

    pub fn set_renderable(&mut self, id: SceneObjectId, renderable: Renderable) -> anyhow::Result<()> {
        self.object_mut(id)?.renderable = Some(renderable);
        Ok(())
    }

    pub fn renderable(&self, id: SceneObjectId) -> Option<&Renderable> {
        self.objects.get(id)?.renderable.as_ref()
    }

    /// Every light with its world transform.
    pub fn lights(&self) -> impl Iterator<Item = (Transform, &Light)> + '_ {
        self.objects.iter().filter_map(|(id, obj)| {
            let light = obj.light.as_ref()?;
            Some((self.world_transform(id).ok()?, light))
        })
    }

    /// Every renderable with its world transform.
    pub fn renderables(&self) -> impl Iterator<Item = (Transform, Renderable)> + '_ {
        self.objects.iter().filter_map(|(id, obj)| {
            let renderable = obj.renderable?;
            Some((self.world_transform(id).ok()?, renderable))
        })
    }
}
