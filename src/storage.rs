/*
 * ESP32 Anemometer
 *
 * MIT license
 *
 * Copyright (c) 2021-2023 Michael Zill
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 *
 * Apache license, Version 2.0
 *
 * Copyright (c) 2021-2023 Michael Zill
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */
use crate::errors::StoreError;
use log::*;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Byte addressed durable storage in the style of an EEPROM emulation:
/// writes land in a cache and only survive a power cycle once committed.
pub trait SettingsStorage {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError>;

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn get_u16(&mut self, offset: usize) -> Result<u16, StoreError> {
        let mut buf = [0; 2];
        self.read(offset, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn set_u16(&mut self, offset: usize, val: u16) -> Result<(), StoreError> {
        self.write(offset, &val.to_le_bytes())
    }
}

impl<T: SettingsStorage + ?Sized> SettingsStorage for &mut T {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        (**self).read(offset, buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        (**self).write(offset, data)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }
}

fn region(
    len_total: usize,
    offset: usize,
    len: usize,
) -> Result<core::ops::Range<usize>, StoreError> {
    match offset.checked_add(len) {
        Some(end) if end <= len_total => Ok(offset..end),
        _ => Err(StoreError::OutOfBounds { offset, len }),
    }
}

/// RAM backed storage. Used by the tests and whenever the node runs without
/// a persistent medium.
pub struct MemoryStorage<const N: usize> {
    cache: [u8; N],
    committed: [u8; N],
    writes: usize,
    fail_from_write: Option<usize>,
}

impl<const N: usize> MemoryStorage<N> {
    pub const fn new() -> Self {
        Self {
            cache: [0; N],
            committed: [0; N],
            writes: 0,
            fail_from_write: None,
        }
    }

    /// Every write starting with the `n`-th one (0 based) fails.
    pub fn fail_from_write(mut self, n: usize) -> Self {
        self.fail_from_write = Some(n);
        self
    }

    /// Drops everything which has not been committed.
    pub fn power_cycle(&mut self) {
        self.cache = self.committed;
    }

    pub fn committed(&self) -> &[u8] {
        &self.committed
    }
}

impl<const N: usize> Default for MemoryStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SettingsStorage for MemoryStorage<N> {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        let range = region(N, offset, buf.len())?;
        buf.copy_from_slice(&self.cache[range]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        let write_no = self.writes;
        self.writes += 1;

        if matches!(self.fail_from_write, Some(n) if write_no >= n) {
            return Err(StoreError::Io(io::ErrorKind::Other));
        }

        let range = region(N, offset, data.len())?;
        self.cache[range].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.committed = self.cache;
        Ok(())
    }
}

/// Settings region kept in a file on the host. The whole region is cached
/// in memory and rewritten and synced on every commit.
pub struct FileStorage {
    path: PathBuf,
    cache: Vec<u8>,
}

impl FileStorage {
    /// Opens the region stored at `path`. A missing or short file reads as
    /// zeros, like an erased flash page.
    pub fn open(path: impl AsRef<Path>, region_size: usize) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let mut cache = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no settings file at {}, starting blank", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        cache.resize(region_size, 0);

        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStorage for FileStorage {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        let range = region(self.cache.len(), offset, buf.len())?;
        buf.copy_from_slice(&self.cache[range]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        let range = region(self.cache.len(), offset, data.len())?;
        self.cache[range].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let mut file = File::create(&self.path)?;
        file.write_all(&self.cache)?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_is_little_endian() {
        let mut storage = MemoryStorage::<4>::new();

        storage.set_u16(1, 0x1234).unwrap();

        assert_eq!(storage.get_u16(1).unwrap(), 0x1234);
        let mut raw = [0; 2];
        storage.read(1, &mut raw).unwrap();
        assert_eq!(raw, [0x34, 0x12]);
    }

    #[test]
    fn access_outside_region_is_rejected() {
        let mut storage = MemoryStorage::<4>::new();

        assert_eq!(
            storage.set_u16(3, 1),
            Err(StoreError::OutOfBounds { offset: 3, len: 2 })
        );
        assert_eq!(
            storage.get_u16(usize::MAX),
            Err(StoreError::OutOfBounds {
                offset: usize::MAX,
                len: 2
            })
        );
    }

    #[test]
    fn uncommitted_writes_are_lost_on_power_cycle() {
        let mut storage = MemoryStorage::<4>::new();

        storage.set_u16(0, 7).unwrap();
        storage.commit().unwrap();
        storage.set_u16(2, 9).unwrap();
        storage.power_cycle();

        assert_eq!(storage.get_u16(0).unwrap(), 7);
        assert_eq!(storage.get_u16(2).unwrap(), 0);
    }

    #[test]
    fn injected_write_failure() {
        let mut storage = MemoryStorage::<4>::new().fail_from_write(1);

        assert!(storage.set_u16(0, 1).is_ok());
        assert_eq!(
            storage.set_u16(2, 1),
            Err(StoreError::Io(io::ErrorKind::Other))
        );
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.bin");

        let mut storage = FileStorage::open(&path, 8).unwrap();
        assert_eq!(storage.get_u16(0).unwrap(), 0);
        storage.set_u16(0, 12).unwrap();
        storage.write(2, &[1, 2, 3]).unwrap();
        storage.commit().unwrap();

        let mut reopened = FileStorage::open(&path, 8).unwrap();
        let mut payload = [0; 3];
        reopened.read(2, &mut payload).unwrap();
        assert_eq!(reopened.get_u16(0).unwrap(), 12);
        assert_eq!(payload, [1, 2, 3]);
    }

    #[test]
    fn file_storage_without_commit_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.bin");

        let mut storage = FileStorage::open(&path, 4).unwrap();
        storage.set_u16(0, 12).unwrap();
        drop(storage);

        let mut reopened = FileStorage::open(&path, 4).unwrap();
        assert_eq!(reopened.get_u16(0).unwrap(), 0);
    }
}
