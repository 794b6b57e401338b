//! Password protection with the Standard security handler (RC4, 128-bit, revision 3).

use std::time::{SystemTime, UNIX_EPOCH};

use lopdf::{dictionary, Document as LopdfDocument, Object, ObjectId, StringFormat};
use serde::{Deserialize, Serialize};

use super::permissions::Permissions;
use super::standard::{self, CryptMethod};
use crate::error::{Error, Result};
use crate::model::PdfDocument;
use crate::objects;

const VERSION: i64 = 2;
const REVISION: i64 = 3;
const KEY_LENGTH: usize = 16;

/// Options for [`protect`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtectionOptions {
    /// Password required to open the document
    pub user_password: Option<String>,

    /// Password that grants full access; defaults to the user password
    pub owner_password: Option<String>,

    /// What the user password allows
    pub permissions: Permissions,
}

impl ProtectionOptions {
    /// Protect with a user password.
    pub fn new(user_password: impl Into<String>) -> Self {
        Self {
            user_password: Some(user_password.into()),
            ..Default::default()
        }
    }

    /// Set the owner password.
    pub fn with_owner_password(mut self, password: impl Into<String>) -> Self {
        self.owner_password = Some(password.into());
        self
    }

    /// Set the user password.
    pub fn with_user_password(mut self, password: impl Into<String>) -> Self {
        self.user_password = Some(password.into());
        self
    }

    /// Set the permissions granted to users.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// At least one non-empty password is required.
    pub fn validate(&self) -> Result<()> {
        let has_user = self.user_password.as_deref().is_some_and(|p| !p.is_empty());
        let has_owner = self.owner_password.as_deref().is_some_and(|p| !p.is_empty());
        if !has_user && !has_owner {
            return Err(Error::validation("at least one password must be provided"));
        }
        Ok(())
    }

    /// User and owner passwords after defaulting.
    fn resolved(&self) -> (String, String) {
        let user = self.user_password.clone().unwrap_or_default();
        let owner = match self.owner_password.as_deref() {
            Some(owner) if !owner.is_empty() => owner.to_string(),
            _ => user.clone(),
        };
        (user, owner)
    }
}

/// Encrypt a document so that it requires a password to open.
pub fn protect(doc: &PdfDocument, options: &ProtectionOptions) -> Result<PdfDocument> {
    options.validate()?;
    let (user, owner) = options.resolved();

    let mut plain = doc.to_lopdf();
    plain.prune_objects();
    let file_id = ensure_file_id(&mut plain);

    let p = options.permissions.to_p_value();
    let o = standard::owner_value(owner.as_bytes(), user.as_bytes(), REVISION, KEY_LENGTH)?;
    let key = standard::file_key(user.as_bytes(), &o, p, &file_id, REVISION, KEY_LENGTH, true);
    let u = standard::user_value(&key, &file_id, REVISION)?;

    let mut encrypted = plain.clone();
    encrypt_objects(&mut encrypted, &key)?;

    let encrypt_id = encrypted.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => VERSION,
        "R" => REVISION,
        "Length" => (KEY_LENGTH * 8) as i64,
        "O" => Object::String(o, StringFormat::Hexadecimal),
        "U" => Object::String(u, StringFormat::Hexadecimal),
        "P" => p as i64,
    });
    encrypted.trailer.set("Encrypt", encrypt_id);

    let bytes = objects::save_to_vec(&mut encrypted)?;
    log::info!(
        "protected {} pages (P = {}, {} bytes)",
        doc.page_count(),
        p,
        bytes.len()
    );
    PdfDocument::from_encrypted_parts(bytes, plain)
}

/// Return the first file identifier, creating the `/ID` pair if missing.
fn ensure_file_id(doc: &mut LopdfDocument) -> Vec<u8> {
    if let Ok(ids) = doc.trailer.get(b"ID").and_then(Object::as_array) {
        if let Some(Object::String(bytes, _)) = ids.first() {
            if !bytes.is_empty() {
                return bytes.clone();
            }
        }
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut seed = nanos.to_le_bytes().to_vec();
    seed.extend_from_slice(&(doc.objects.len() as u64).to_le_bytes());
    let id = standard::md5(&seed).to_vec();

    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id.clone(), StringFormat::Hexadecimal),
        ]),
    );
    id
}

fn encrypt_objects(doc: &mut LopdfDocument, key: &[u8]) -> Result<()> {
    for (id, object) in doc.objects.iter_mut() {
        match object {
            Object::Stream(stream) => {
                if matches!(
                    stream.dict.get(b"Type").and_then(Object::as_name),
                    Ok(b"XRef")
                ) {
                    continue;
                }
                let data = encrypt_bytes(key, *id, &stream.content)?;
                encrypt_strings_in_dict(&mut stream.dict, key, *id)?;
                stream.set_content(data);
            }
            other => encrypt_strings(other, key, *id)?,
        }
    }
    Ok(())
}

fn encrypt_bytes(key: &[u8], id: ObjectId, data: &[u8]) -> Result<Vec<u8>> {
    standard::rc4(&standard::object_key(key, id, CryptMethod::Rc4), data)
}

fn encrypt_strings(object: &mut Object, key: &[u8], id: ObjectId) -> Result<()> {
    match object {
        Object::String(bytes, format) => {
            *bytes = encrypt_bytes(key, id, bytes)?;
            // Ciphertext is binary; hex keeps the writer from having to escape it.
            *format = StringFormat::Hexadecimal;
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                encrypt_strings(item, key, id)?;
            }
        }
        Object::Dictionary(dict) => encrypt_strings_in_dict(dict, key, id)?,
        _ => {}
    }
    Ok(())
}

fn encrypt_strings_in_dict(dict: &mut lopdf::Dictionary, key: &[u8], id: ObjectId) -> Result<()> {
    for (_, value) in dict.iter_mut() {
        encrypt_strings(value, key, id)?;
    }
    Ok(())
}
