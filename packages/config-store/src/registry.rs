//! Windows registry backend.

use winreg::enums::{
    RegType, HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE,
    HKEY_USERS, KEY_READ,
};
use winreg::types::FromRegValue;
use winreg::RegKey;

use crate::{AccessFlags, ConfigBackend, Error, KeyHandle, KeyPath, RootDomain, Value};

/// Read-only access to the registry of the current machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistryStore;

impl RegistryStore {
    pub fn new() -> Self {
        Self
    }

    fn predef(domain: RootDomain) -> RegKey {
        RegKey::predef(match domain {
            RootDomain::ClassesRoot => HKEY_CLASSES_ROOT,
            RootDomain::CurrentUser => HKEY_CURRENT_USER,
            RootDomain::LocalMachine => HKEY_LOCAL_MACHINE,
            RootDomain::Users => HKEY_USERS,
            RootDomain::CurrentConfig => HKEY_CURRENT_CONFIG,
        })
    }
}

impl ConfigBackend for RegistryStore {
    fn open(
        &self,
        domain: RootDomain,
        path: &KeyPath,
        flags: AccessFlags,
    ) -> Result<Box<dyn KeyHandle>, Error> {
        let key = Self::predef(domain)
            .open_subkey_with_flags(path.to_native(), KEY_READ | flags.bits())
            .map_err(|e| Error::from_io(path, e))?;
        Ok(Box::new(RegistryHandle {
            key,
            path: path.clone(),
        }))
    }
}

/// Owns the opened `RegKey`; dropping it closes the native handle.
struct RegistryHandle {
    key: RegKey,
    path: KeyPath,
}

impl RegistryHandle {
    fn convert(&self, raw: &winreg::RegValue) -> Result<Value, Error> {
        let decode_err = |e| Error::from_io(&self.path, e);
        Ok(match raw.vtype {
            RegType::REG_SZ => Value::String(String::from_reg_value(raw).map_err(decode_err)?),
            RegType::REG_EXPAND_SZ => {
                Value::ExpandString(String::from_reg_value(raw).map_err(decode_err)?)
            }
            RegType::REG_MULTI_SZ => {
                Value::MultiString(Vec::<String>::from_reg_value(raw).map_err(decode_err)?)
            }
            RegType::REG_DWORD => Value::Dword(u32::from_reg_value(raw).map_err(decode_err)?),
            RegType::REG_QWORD => Value::Qword(u64::from_reg_value(raw).map_err(decode_err)?),
            RegType::REG_NONE => Value::None,
            _ => Value::Binary(raw.bytes.to_vec()),
        })
    }
}

impl KeyHandle for RegistryHandle {
    fn subkey_name(&self, index: u32) -> Result<Option<String>, Error> {
        match self.key.enum_keys().nth(index as usize) {
            None => Ok(None),
            Some(Ok(name)) => Ok(Some(name)),
            Some(Err(e)) => Err(Error::from_io(&self.path, e)),
        }
    }

    fn value(&self, index: u32) -> Result<Option<(String, Value)>, Error> {
        match self.key.enum_values().nth(index as usize) {
            None => Ok(None),
            Some(Ok((name, raw))) => Ok(Some((name, self.convert(&raw)?))),
            Some(Err(e)) => Err(Error::from_io(&self.path, e)),
        }
    }
}
