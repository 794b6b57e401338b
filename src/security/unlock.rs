//! Removing Standard-handler encryption.

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use super::standard::{decrypt_bytes, CryptMethod, StandardHandler};
use crate::error::{Error, Result};
use crate::model::PdfDocument;

/// Remove password protection from a document.
///
/// `password` may be either the user or the owner password. The returned
/// document has no `/Encrypt` dictionary.
pub fn unlock(data: impl Into<Vec<u8>>, password: &str) -> Result<PdfDocument> {
    if password.is_empty() {
        return Err(Error::validation("a password is required to unlock a document"));
    }
    let source = PdfDocument::from_bytes_with_password(data, Some(password))?;
    if !source.was_encrypted() {
        log::info!("document is not encrypted; writing an unchanged copy");
    }
    PdfDocument::from_lopdf(source.to_lopdf())
}

/// Decrypt every string and stream of a loaded document in place.
///
/// Does nothing if the trailer has no `/Encrypt` entry.
pub(crate) fn decrypt_document(doc: &mut LopdfDocument, password: &str) -> Result<()> {
    let encrypt = match doc.trailer.get(b"Encrypt") {
        Ok(obj) => obj.clone(),
        Err(_) => return Ok(()),
    };
    let (encrypt_id, dict) = match &encrypt {
        Object::Reference(id) => (Some(*id), doc.get_dictionary(*id)?.clone()),
        Object::Dictionary(dict) => (None, dict.clone()),
        _ => return Err(Error::Corrupted("/Encrypt is not a dictionary".into())),
    };

    let handler = StandardHandler::from_dict(&dict)?;
    let file_id = first_file_id(doc);
    let key = handler.authenticate(password.as_bytes(), &file_id)?;
    log::debug!(
        "authenticated Standard handler V{} R{} ({}-bit)",
        handler.version,
        handler.revision,
        handler.key_length * 8
    );

    let ids: Vec<ObjectId> = doc.objects.keys().copied().collect();
    for id in ids {
        if Some(id) == encrypt_id {
            continue;
        }
        let Some(object) = doc.objects.get_mut(&id) else {
            continue;
        };
        match object {
            Object::Stream(stream) => {
                if is_unencrypted_stream(&stream.dict, handler.encrypt_metadata) {
                    continue;
                }
                let plain = decrypt_bytes(&key, id, handler.stream_method, &stream.content)?;
                decrypt_strings_in_dict(&mut stream.dict, &key, id, handler.string_method)?;
                stream.set_content(plain);
            }
            other => decrypt_strings(other, &key, id, handler.string_method)?,
        }
    }

    doc.trailer.remove(b"Encrypt");
    if let Some(id) = encrypt_id {
        doc.objects.remove(&id);
    }
    Ok(())
}

fn first_file_id(doc: &LopdfDocument) -> Vec<u8> {
    match doc.trailer.get(b"ID").and_then(Object::as_array) {
        Ok(ids) => match ids.first() {
            Some(Object::String(bytes, _)) => bytes.clone(),
            _ => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

fn is_unencrypted_stream(dict: &lopdf::Dictionary, encrypt_metadata: bool) -> bool {
    match dict.get(b"Type").and_then(Object::as_name) {
        Ok(b"XRef") => true,
        Ok(b"Metadata") => !encrypt_metadata,
        _ => false,
    }
}

fn decrypt_strings(
    object: &mut Object,
    key: &[u8],
    id: ObjectId,
    method: CryptMethod,
) -> Result<()> {
    match object {
        Object::String(bytes, _) => {
            *bytes = decrypt_bytes(key, id, method, bytes)?;
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                decrypt_strings(item, key, id, method)?;
            }
        }
        Object::Dictionary(dict) => decrypt_strings_in_dict(dict, key, id, method)?,
        _ => {}
    }
    Ok(())
}

fn decrypt_strings_in_dict(
    dict: &mut lopdf::Dictionary,
    key: &[u8],
    id: ObjectId,
    method: CryptMethod,
) -> Result<()> {
    for (_, value) in dict.iter_mut() {
        decrypt_strings(value, key, id, method)?;
    }
    Ok(())
}
