//! The native Windows registry.
//!
//! Uses the ANSI entry points, so value sizes are byte counts that include
//! the NUL terminator, matching the other backends.

use std::ffi::CString;
use std::io;
use std::ptr;

use tracing::warn;
use windows_sys::Win32::Foundation::ERROR_SUCCESS;
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExA, RegOpenKeyExA, RegQueryValueExA, RegSetValueExA, HKEY,
    HKEY_CLASSES_ROOT, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS, KEY_ALL_ACCESS,
    KEY_CREATE_SUB_KEY, KEY_READ, REG_OPTION_NON_VOLATILE, REG_OPTION_VOLATILE,
};

use crate::backend::{KeyAccess, KeyHandle, RegistryBackend, ValueInfo, Volatility};
use crate::hive::Hive;
use crate::value::ValueType;

/// [`RegistryBackend`] over the Win32 registry API.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsRegistry;

fn hive_handle(hive: Hive) -> HKEY {
    match hive {
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
        Hive::CurrentUser => HKEY_CURRENT_USER,
        Hive::Users => HKEY_USERS,
        Hive::ClassesRoot => HKEY_CLASSES_ROOT,
    }
}

fn to_hkey(key: KeyHandle) -> HKEY {
    key.as_raw() as usize as HKEY
}

fn from_hkey(key: HKEY) -> KeyHandle {
    KeyHandle::from_raw(key as usize as u64)
}

fn c_string(s: &str) -> io::Result<CString> {
    CString::new(s).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

fn check(status: u32) -> io::Result<()> {
    if status == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(status as i32))
    }
}

impl RegistryBackend for WindowsRegistry {
    fn open_key(&self, hive: Hive, subkey: &str, access: KeyAccess) -> io::Result<KeyHandle> {
        let subkey = c_string(subkey)?;
        let rights = match access {
            KeyAccess::Read => KEY_READ,
            KeyAccess::AllAccess => KEY_ALL_ACCESS,
            KeyAccess::CreateSubKey => KEY_CREATE_SUB_KEY,
        };
        let mut key: HKEY = ptr::null_mut();
        // SAFETY: all pointers are valid for the duration of the call.
        let status = unsafe {
            RegOpenKeyExA(hive_handle(hive), subkey.as_ptr().cast(), 0, rights, &mut key)
        };
        check(status)?;
        Ok(from_hkey(key))
    }

    fn query_value(&self, key: KeyHandle, name: &str) -> io::Result<ValueInfo> {
        let name = c_string(name)?;
        let mut kind = 0u32;
        let mut size = 0u32;
        // SAFETY: a null data pointer asks for type and size only.
        let status = unsafe {
            RegQueryValueExA(
                to_hkey(key),
                name.as_ptr().cast(),
                ptr::null(),
                &mut kind,
                ptr::null_mut(),
                &mut size,
            )
        };
        check(status)?;
        Ok(ValueInfo {
            kind: ValueType::from_raw(kind),
            size: size as usize,
        })
    }

    fn read_value(&self, key: KeyHandle, name: &str, buf: &mut [u8]) -> io::Result<usize> {
        let name = c_string(name)?;
        let mut kind = 0u32;
        let mut size = u32::try_from(buf.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: `buf` is writable for `size` bytes.
        let status = unsafe {
            RegQueryValueExA(
                to_hkey(key),
                name.as_ptr().cast(),
                ptr::null(),
                &mut kind,
                buf.as_mut_ptr(),
                &mut size,
            )
        };
        check(status)?;
        Ok(size as usize)
    }

    fn set_value(
        &self,
        key: KeyHandle,
        name: &str,
        kind: ValueType,
        data: &[u8],
    ) -> io::Result<()> {
        let name = c_string(name)?;
        let len = u32::try_from(data.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: `data` is readable for `len` bytes.
        let status = unsafe {
            RegSetValueExA(
                to_hkey(key),
                name.as_ptr().cast(),
                0,
                kind.to_raw(),
                data.as_ptr(),
                len,
            )
        };
        check(status)
    }

    fn create_key(
        &self,
        parent: KeyHandle,
        name: &str,
        volatility: Volatility,
    ) -> io::Result<KeyHandle> {
        let name = c_string(name)?;
        let options = match volatility {
            Volatility::NonVolatile => REG_OPTION_NON_VOLATILE,
            Volatility::Volatile => REG_OPTION_VOLATILE,
        };
        let mut key: HKEY = ptr::null_mut();
        let mut disposition = 0u32;
        // SAFETY: all pointers are valid for the duration of the call.
        let status = unsafe {
            RegCreateKeyExA(
                to_hkey(parent),
                name.as_ptr().cast(),
                0,
                ptr::null(),
                options,
                KEY_ALL_ACCESS,
                ptr::null(),
                &mut key,
                &mut disposition,
            )
        };
        check(status)?;
        Ok(from_hkey(key))
    }

    fn close_key(&self, key: KeyHandle) {
        // SAFETY: the handle came from RegOpenKeyExA or RegCreateKeyExA.
        let status = unsafe { RegCloseKey(to_hkey(key)) };
        if status != ERROR_SUCCESS {
            warn!(handle = key.as_raw(), status, "RegCloseKey failed");
        }
    }
}
