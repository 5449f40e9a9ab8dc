//! Host platform seam: where model bytes and textures come from.

use hashbrown::HashMap;
use log::debug;

use crate::assets::{decode_json, ModelData};
use crate::error::ModelError;
use crate::ids::TextureId;
use crate::model::Model;

/// Resource loader injected into [`crate::BaseModel`].
pub trait Platform {
    /// Load and build a model.
    fn load_model(&mut self, path: &str) -> Result<Model, ModelError>;

    /// Raw asset bytes (motions, expressions, pose, physics).
    fn load_bytes(&mut self, path: &str) -> Result<Vec<u8>, ModelError>;

    /// Upload a texture and bind it to `slot` on `model`.
    fn load_texture(&mut self, model: &mut Model, slot: usize, path: &str)
        -> Result<(), ModelError>;
}

/// Path-keyed in-memory platform. Models are JSON encoded [`ModelData`]; textures are
/// registered files that receive sequential ids, one per distinct path.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    files: HashMap<String, Vec<u8>>,
    textures: HashMap<String, TextureId>,
    next_texture: u32,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn get(&self, path: &str) -> Result<&[u8], ModelError> {
        self.files
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| ModelError::io(path, "no such file"))
    }
}

impl Platform for MemoryPlatform {
    fn load_model(&mut self, path: &str) -> Result<Model, ModelError> {
        let data: ModelData = decode_json(path, self.get(path)?)?;
        Model::from_data(data)
    }

    fn load_bytes(&mut self, path: &str) -> Result<Vec<u8>, ModelError> {
        self.get(path).map(<[u8]>::to_vec)
    }

    fn load_texture(
        &mut self,
        model: &mut Model,
        slot: usize,
        path: &str,
    ) -> Result<(), ModelError> {
        self.get(path)?;
        let id = match self.textures.get(path) {
            Some(&id) => id,
            None => {
                let id = TextureId(self.next_texture);
                self.next_texture += 1;
                self.textures.insert(path.to_string(), id);
                id
            }
        };
        debug!("texture '{path}' -> slot {slot} as {id:?}");
        model.bind_texture(slot, id);
        Ok(())
    }
}
