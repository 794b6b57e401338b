//! The PDF Standard security handler (revisions 2 to 4).
//!
//! Key derivation follows the password algorithms of ISO 32000-1 §7.6.3:
//! the file key is an MD5 digest over the padded password, `/O`, `/P` and the
//! first file identifier; each object is then encrypted with a key derived
//! from the file key and its object number.

use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use lopdf::{Dictionary, Object, ObjectId};
use md5::{Digest, Md5};
use rc4::{consts::*, KeyInit, Rc4, StreamCipher};

use crate::error::{Error, Result};

/// Password padding string.
pub(crate) const PAD: [u8; 32] = [
    0x28, 0xbf, 0x4e, 0x5e, 0x4e, 0x75, 0x8a, 0x41, 0x64, 0x00, 0x4e, 0x56, 0xff, 0xfa, 0x01, 0x08,
    0x2e, 0x2e, 0x00, 0xb6, 0xd0, 0x68, 0x3e, 0x80, 0x2f, 0x0c, 0xa9, 0xfe, 0x64, 0x53, 0x69, 0x7a,
];

const AES_SALT: &[u8] = b"sAlT";

/// Cipher used for strings or streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CryptMethod {
    Identity,
    Rc4,
    Aes128,
}

/// Parameters of a Standard security handler, as found in `/Encrypt`.
#[derive(Debug, Clone)]
pub(crate) struct StandardHandler {
    pub version: i64,
    pub revision: i64,
    /// File key length in bytes
    pub key_length: usize,
    pub owner_value: Vec<u8>,
    pub user_value: Vec<u8>,
    pub permissions: i32,
    pub encrypt_metadata: bool,
    pub string_method: CryptMethod,
    pub stream_method: CryptMethod,
}

impl StandardHandler {
    /// Read handler parameters from an `/Encrypt` dictionary.
    pub fn from_dict(dict: &Dictionary) -> Result<Self> {
        let filter = dict
            .get(b"Filter")
            .and_then(Object::as_name)
            .map_err(|_| Error::Corrupted("encryption dictionary without /Filter".into()))?;
        if filter != b"Standard" {
            return Err(Error::UnsupportedEncryption(format!(
                "security handler /{}",
                String::from_utf8_lossy(filter)
            )));
        }

        let version = integer(dict, b"V").unwrap_or(0);
        let revision = integer(dict, b"R")
            .ok_or_else(|| Error::Corrupted("encryption dictionary without /R".into()))?;
        if version >= 5 || revision >= 5 {
            return Err(Error::UnsupportedEncryption(format!(
                "AES-256 (V{} R{})",
                version, revision
            )));
        }

        let owner_value = string(dict, b"O")?;
        let user_value = string(dict, b"U")?;
        let permissions = integer(dict, b"P")
            .ok_or_else(|| Error::Corrupted("encryption dictionary without /P".into()))?
            as i32;
        let encrypt_metadata = dict
            .get(b"EncryptMetadata")
            .and_then(Object::as_bool)
            .unwrap_or(true);

        let (key_length, string_method, stream_method) = match version {
            0 | 1 => (5, CryptMethod::Rc4, CryptMethod::Rc4),
            2 | 3 => {
                let bits = integer(dict, b"Length").unwrap_or(40);
                (bits_to_bytes(bits)?, CryptMethod::Rc4, CryptMethod::Rc4)
            }
            4 => {
                let string_method = crypt_filter_method(dict, b"StrF")?;
                let stream_method = crypt_filter_method(dict, b"StmF")?;
                (16, string_method, stream_method)
            }
            other => {
                return Err(Error::UnsupportedEncryption(format!("/V {}", other)));
            }
        };

        Ok(Self {
            version,
            revision,
            key_length,
            owner_value,
            user_value,
            permissions,
            encrypt_metadata,
            string_method,
            stream_method,
        })
    }

    /// Authenticate as user or owner and return the file key.
    pub fn authenticate(&self, password: &[u8], file_id: &[u8]) -> Result<Vec<u8>> {
        if let Some(key) = self.check_user_password(password, file_id) {
            return Ok(key);
        }
        let user_password = recover_user_password(
            password,
            &self.owner_value,
            self.revision,
            self.key_length,
        )?;
        self.check_user_password(&user_password, file_id)
            .ok_or(Error::InvalidPassword)
    }

    fn check_user_password(&self, password: &[u8], file_id: &[u8]) -> Option<Vec<u8>> {
        let key = file_key(
            password,
            &self.owner_value,
            self.permissions,
            file_id,
            self.revision,
            self.key_length,
            self.encrypt_metadata,
        );
        let expected = user_value(&key, file_id, self.revision).ok()?;
        // Only the first 16 bytes are significant for R3 and later.
        let significant = if self.revision >= 3 { 16 } else { 32 };
        if self.user_value.len() >= significant
            && expected[..significant] == self.user_value[..significant]
        {
            Some(key)
        } else {
            None
        }
    }
}

fn integer(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).and_then(Object::as_i64).ok()
}

fn string(dict: &Dictionary, key: &[u8]) -> Result<Vec<u8>> {
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => Ok(bytes.clone()),
        _ => Err(Error::Corrupted(format!(
            "encryption dictionary without /{}",
            String::from_utf8_lossy(key)
        ))),
    }
}

fn bits_to_bytes(bits: i64) -> Result<usize> {
    if !(40..=128).contains(&bits) || bits % 8 != 0 {
        return Err(Error::UnsupportedEncryption(format!("key length {} bits", bits)));
    }
    Ok((bits / 8) as usize)
}

fn crypt_filter_method(dict: &Dictionary, key: &[u8]) -> Result<CryptMethod> {
    let name = match dict.get(key).and_then(Object::as_name) {
        Ok(name) => name,
        Err(_) => return Ok(CryptMethod::Identity),
    };
    if name == b"Identity" {
        return Ok(CryptMethod::Identity);
    }
    let filter = dict
        .get(b"CF")
        .and_then(Object::as_dict)
        .and_then(|cf| cf.get(name))
        .and_then(Object::as_dict)
        .map_err(|_| {
            Error::Corrupted(format!(
                "crypt filter /{} is not defined",
                String::from_utf8_lossy(name)
            ))
        })?;
    match filter.get(b"CFM").and_then(Object::as_name) {
        Ok(b"AESV2") => Ok(CryptMethod::Aes128),
        Ok(b"V2") => Ok(CryptMethod::Rc4),
        Ok(b"None") | Err(_) => Ok(CryptMethod::Identity),
        Ok(other) => Err(Error::UnsupportedEncryption(format!(
            "crypt filter method /{}",
            String::from_utf8_lossy(other)
        ))),
    }
}

pub(crate) fn md5(data: &[u8]) -> [u8; 16] {
    Md5::digest(data).into()
}

/// Pad or truncate a password to exactly 32 bytes.
pub(crate) fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PAD[..32 - len]);
    padded
}

/// RC4 over `data`. Key lengths from 40 to 128 bits are supported.
pub(crate) fn rc4(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut buf = data.to_vec();

    macro_rules! apply {
        ($($len:literal => $size:ty),*) => {
            match key.len() {
                $($len => {
                    let mut cipher = Rc4::<$size>::new_from_slice(key)
                        .map_err(|_| Error::UnsupportedEncryption(format!("RC4 key of {} bytes", key.len())))?;
                    cipher.apply_keystream(&mut buf);
                })*
                other => {
                    return Err(Error::UnsupportedEncryption(format!("RC4 key of {} bytes", other)));
                }
            }
        };
    }

    apply!(
        5 => U5, 6 => U6, 7 => U7, 8 => U8, 9 => U9, 10 => U10,
        11 => U11, 12 => U12, 13 => U13, 14 => U14, 15 => U15, 16 => U16
    );
    Ok(buf)
}

/// The 20 RC4 passes used by revision 3: key XOR 0, key XOR 1, ... key XOR 19.
fn rc4_rounds(key: &[u8], data: &[u8], rounds: impl Iterator<Item = u8>) -> Result<Vec<u8>> {
    let mut out = data.to_vec();
    for i in rounds {
        let round_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
        out = rc4(&round_key, &out)?;
    }
    Ok(out)
}

/// Key derived from the owner password, used to encrypt and decrypt `/O`.
fn owner_key(owner_password: &[u8], revision: i64, key_length: usize) -> Vec<u8> {
    let mut hash = md5(&pad_password(owner_password));
    if revision >= 3 {
        for _ in 0..50 {
            hash = md5(&hash);
        }
    }
    hash[..key_length].to_vec()
}

/// Compute the `/O` value (Algorithm 3).
pub(crate) fn owner_value(
    owner_password: &[u8],
    user_password: &[u8],
    revision: i64,
    key_length: usize,
) -> Result<Vec<u8>> {
    let key = owner_key(owner_password, revision, key_length);
    let padded_user = pad_password(user_password);
    if revision >= 3 {
        rc4_rounds(&key, &padded_user, 0..=19)
    } else {
        rc4(&key, &padded_user)
    }
}

/// Recover the padded user password from `/O` given the owner password.
fn recover_user_password(
    owner_password: &[u8],
    owner_value: &[u8],
    revision: i64,
    key_length: usize,
) -> Result<Vec<u8>> {
    let key = owner_key(owner_password, revision, key_length);
    let data = &owner_value[..owner_value.len().min(32)];
    if revision >= 3 {
        rc4_rounds(&key, data, (0..=19).rev())
    } else {
        rc4(&key, data)
    }
}

/// Compute the file encryption key (Algorithm 2).
pub(crate) fn file_key(
    password: &[u8],
    owner_value: &[u8],
    permissions: i32,
    file_id: &[u8],
    revision: i64,
    key_length: usize,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(pad_password(password));
    hasher.update(owner_value);
    hasher.update(permissions.to_le_bytes());
    hasher.update(file_id);
    if revision >= 4 && !encrypt_metadata {
        hasher.update([0xFF; 4]);
    }
    let mut hash: [u8; 16] = hasher.finalize().into();
    if revision >= 3 {
        for _ in 0..50 {
            hash = md5(&hash[..key_length]);
        }
    }
    hash[..key_length].to_vec()
}

/// Compute the `/U` value (Algorithms 4 and 5).
pub(crate) fn user_value(key: &[u8], file_id: &[u8], revision: i64) -> Result<Vec<u8>> {
    if revision >= 3 {
        let mut seed = Vec::with_capacity(32 + file_id.len());
        seed.extend_from_slice(&PAD);
        seed.extend_from_slice(file_id);
        let digest = md5(&seed);
        let mut out = rc4_rounds(key, &digest, 0..=19)?;
        // Arbitrary padding up to 32 bytes.
        out.extend_from_slice(&PAD[..16]);
        Ok(out)
    } else {
        rc4(key, &PAD)
    }
}

/// Per-object key: MD5(file key, object number, generation[, "sAlT"]).
pub(crate) fn object_key(file_key: &[u8], id: ObjectId, method: CryptMethod) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update(&id.0.to_le_bytes()[..3]);
    hasher.update(&id.1.to_le_bytes()[..2]);
    if method == CryptMethod::Aes128 {
        hasher.update(AES_SALT);
    }
    let hash: [u8; 16] = hasher.finalize().into();
    hash[..(file_key.len() + 5).min(16)].to_vec()
}

/// Decrypt the payload of one string or stream.
pub(crate) fn decrypt_bytes(
    file_key: &[u8],
    id: ObjectId,
    method: CryptMethod,
    data: &[u8],
) -> Result<Vec<u8>> {
    match method {
        CryptMethod::Identity => Ok(data.to_vec()),
        CryptMethod::Rc4 => rc4(&object_key(file_key, id, method), data),
        CryptMethod::Aes128 => {
            if data.is_empty() {
                return Ok(Vec::new());
            }
            if data.len() < 16 || data.len() % 16 != 0 {
                return Err(Error::Corrupted(format!(
                    "AES payload of object {} {} has invalid length {}",
                    id.0,
                    id.1,
                    data.len()
                )));
            }
            let key = object_key(file_key, id, method);
            let (iv, body) = data.split_at(16);
            cbc::Decryptor::<Aes128>::new_from_slices(&key, iv)
                .map_err(|e| Error::Corrupted(e.to_string()))?
                .decrypt_padded_vec_mut::<Pkcs7>(body)
                .map_err(|_| Error::InvalidPassword)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_pad_password() {
        assert_eq!(pad_password(b""), PAD);
        let padded = pad_password(b"abc");
        assert_eq!(&padded[..3], b"abc");
        assert_eq!(&padded[3..], &PAD[..29]);
        let long = [b'x'; 40];
        assert_eq!(pad_password(&long), [b'x'; 32]);
    }

    #[test]
    fn test_rc4_is_symmetric() {
        let key = b"0123456789abcdef";
        let encrypted = rc4(key, b"attack at dawn").unwrap();
        assert_ne!(encrypted, b"attack at dawn");
        assert_eq!(rc4(key, &encrypted).unwrap(), b"attack at dawn");
    }

    #[test]
    fn test_rc4_rejects_bad_key_length() {
        assert!(rc4(b"abc", b"data").is_err());
    }

    #[test]
    fn test_user_and_owner_authentication() {
        let file_id = md5(b"file identifier");
        let p = -3904;
        let o = owner_value(b"owner", b"user", 3, 16).unwrap();
        let key = file_key(b"user", &o, p, &file_id, 3, 16, true);
        let u = user_value(&key, &file_id, 3).unwrap();
        assert_eq!(u.len(), 32);

        let handler = StandardHandler {
            version: 2,
            revision: 3,
            key_length: 16,
            owner_value: o,
            user_value: u,
            permissions: p,
            encrypt_metadata: true,
            string_method: CryptMethod::Rc4,
            stream_method: CryptMethod::Rc4,
        };

        assert_eq!(handler.authenticate(b"user", &file_id).unwrap(), key);
        assert_eq!(handler.authenticate(b"owner", &file_id).unwrap(), key);
        assert!(matches!(
            handler.authenticate(b"wrong", &file_id),
            Err(Error::InvalidPassword)
        ));
    }

    #[test]
    fn test_revision_2_round_trip() {
        let file_id = [7u8; 16];
        let o = owner_value(b"", b"", 2, 5).unwrap();
        let key = file_key(b"", &o, -4, &file_id, 2, 5, true);
        let u = user_value(&key, &file_id, 2).unwrap();
        let handler = StandardHandler {
            version: 1,
            revision: 2,
            key_length: 5,
            owner_value: o,
            user_value: u,
            permissions: -4,
            encrypt_metadata: true,
            string_method: CryptMethod::Rc4,
            stream_method: CryptMethod::Rc4,
        };
        assert_eq!(handler.authenticate(b"", &file_id).unwrap(), key);
    }

    #[test]
    fn test_object_key_length() {
        let key = [1u8; 5];
        assert_eq!(object_key(&key, (12, 0), CryptMethod::Rc4).len(), 10);
        let key = [1u8; 16];
        assert_eq!(object_key(&key, (12, 0), CryptMethod::Aes128).len(), 16);
    }

    #[test]
    fn test_aes_decrypt() {
        use cbc::cipher::BlockEncryptMut;

        let file_key = [9u8; 16];
        let id = (4, 0);
        let key = object_key(&file_key, id, CryptMethod::Aes128);
        let iv = [3u8; 16];
        let body = cbc::Encryptor::<Aes128>::new_from_slices(&key, &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(b"BT /F1 12 Tf ET");
        let mut payload = iv.to_vec();
        payload.extend_from_slice(&body);

        let plain = decrypt_bytes(&file_key, id, CryptMethod::Aes128, &payload).unwrap();
        assert_eq!(plain, b"BT /F1 12 Tf ET");
    }

    #[test]
    fn test_aes256_is_unsupported() {
        let dict = lopdf::dictionary! {
            "Filter" => "Standard",
            "V" => 5,
            "R" => 6,
        };
        assert!(matches!(
            StandardHandler::from_dict(&dict),
            Err(Error::UnsupportedEncryption(_))
        ));
    }
}
