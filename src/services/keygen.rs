use entity::{application, user};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of generated keys, in hex characters.
pub const KEY_LEN: usize = 40;

/// Produces the API key handed out for an application.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self, owner: &user::Model, app: &application::Model) -> String;
}

/// Hashes the application and owner ids together with the current time and
/// random salt. Collisions are left to the unique index on `applications.key`.
#[derive(Debug, Clone, Default)]
pub struct Sha256KeyGenerator;

impl KeyGenerator for Sha256KeyGenerator {
    fn generate(&self, owner: &user::Model, app: &application::Model) -> String {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);

        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(app.id.as_bytes());
        hasher.update(owner.id.as_bytes());
        hasher.update(nanos.to_le_bytes());
        hasher.update(salt);

        let mut key = hex::encode(hasher.finalize());
        key.truncate(KEY_LEN);
        key
    }
}
