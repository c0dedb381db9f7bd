use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use slotmap::{SlotMap, new_key_type};

use crate::{
    data_structures::{model::Mesh, texture::Texture},
    resources::{
        material::Material,
        mesh::{MeshData, MeshImportOptions},
        texture::{TextureData, TextureImportOptions, TextureProperties},
    },
};

/**
 * This module contains all logic for loading meshes and textures from asset
 * files and for keeping the resulting GPU resources addressable by handle.
 */
pub mod material;
pub mod mesh;
pub mod texture;

new_key_type! {
    pub struct MeshHandle;
    pub struct TextureHandle;
    pub struct MaterialHandle;
}

/// Where asset names are looked up.
///
/// Relative names are tried against the configured root first and then
/// against the copy of `assets/` bundled by the build script. Absolute paths
/// are used as they are.
#[derive(Debug, Clone)]
pub struct AssetSource {
    roots: Vec<PathBuf>,
}

impl AssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![
                root.into(),
                Path::new(env!("OUT_DIR")).join("assets"),
            ],
        }
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.roots
            .iter()
            .map(|root| root.join(path))
            .find(|candidate| candidate.exists())
            .unwrap_or_else(|| self.roots[0].join(path))
    }

    pub async fn load_binary(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.resolve(name);
        std::fs::read(&path).with_context(|| format!("cannot read asset {}", path.display()))
    }

    pub async fn load_string(&self, name: &str) -> anyhow::Result<String> {
        let path = self.resolve(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read asset {}", path.display()))
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Read and decode a mesh file. Supported: `.obj`, `.gltf`, `.glb`.
pub async fn load_mesh_data(
    assets: &AssetSource,
    name: &str,
    options: &MeshImportOptions,
) -> anyhow::Result<MeshData> {
    match extension(name).as_deref() {
        Some("obj") => {
            let text = assets.load_string(name).await?;
            MeshData::from_obj(&text, options).with_context(|| format!("invalid OBJ file {name}"))
        }
        Some("gltf") | Some("glb") => {
            let path = assets.resolve(name);
            let (document, buffers, _) = gltf::import(&path)
                .with_context(|| format!("cannot import glTF file {}", path.display()))?;
            let buffers: Vec<Vec<u8>> = buffers.into_iter().map(|data| data.0).collect();
            MeshData::from_gltf(&document, &buffers, options)
                .with_context(|| format!("invalid glTF file {name}"))
        }
        Some(other) => bail!("unsupported mesh format .{other} ({name})"),
        None => bail!("mesh file {name} has no extension"),
    }
}

pub async fn load_texture_data(
    assets: &AssetSource,
    name: &str,
    options: &TextureImportOptions,
) -> anyhow::Result<TextureData> {
    let bytes = assets.load_binary(name).await?;
    TextureData::from_bytes(&bytes, extension(name).as_deref(), options)
        .with_context(|| format!("cannot decode texture {name}"))
}

#[derive(Debug)]
pub struct TextureEntry {
    pub texture: Texture,
    pub properties: TextureProperties,
}

/// Owner of every mesh, texture and material the scene refers to by handle.
#[derive(Debug)]
pub struct Resources {
    assets: AssetSource,
    meshes: SlotMap<MeshHandle, Mesh>,
    textures: SlotMap<TextureHandle, TextureEntry>,
    materials: SlotMap<MaterialHandle, Material>,
}

impl Resources {
    pub fn new(assets: AssetSource) -> Self {
        Self {
            assets,
            meshes: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            materials: SlotMap::with_key(),
        }
    }

    pub fn assets(&self) -> &AssetSource {
        &self.assets
    }

    pub async fn import_mesh(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        options: &MeshImportOptions,
    ) -> anyhow::Result<MeshHandle> {
        let data = load_mesh_data(&self.assets, name, options).await?;
        log::info!(
            "Imported mesh {name}: {} vertices, {} triangles",
            data.vertices.len(),
            data.indices.len() / 3
        );
        Ok(self.add_mesh(device, name, &data))
    }

    pub async fn import_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        options: &TextureImportOptions,
    ) -> anyhow::Result<TextureHandle> {
        let data = load_texture_data(&self.assets, name, options).await?;
        Ok(self.add_texture(device, queue, name, &data))
    }

    pub fn add_mesh(&mut self, device: &wgpu::Device, name: &str, data: &MeshData) -> MeshHandle {
        self.meshes.insert(Mesh::upload(device, name, data))
    }

    pub fn add_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        data: &TextureData,
    ) -> TextureHandle {
        let texture = Texture::from_data(device, queue, data, name);
        self.textures.insert(TextureEntry {
            texture,
            properties: data.properties(),
        })
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle).map(|entry| &entry.texture)
    }

    pub fn texture_properties(&self, handle: TextureHandle) -> Option<TextureProperties> {
        self.textures.get(handle).map(|entry| entry.properties)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle)
    }
}
