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
use crate::errors::{SettingsError, StoreError};
use crate::global_settings;
use crate::state::Channel;
use crate::storage::SettingsStorage;
use core::mem::size_of;
use core::num::NonZeroU32;
use log::*;
use serde::{Deserialize, Serialize};

/// User tunable calibration and sampling parameters, persisted across
/// power cycles.
///
/// The layout is fixed (`repr(C)`) because its size doubles as the schema
/// tag of the persisted record. Adding, removing or resizing a field changes
/// the tag and makes the node fall back to the compiled defaults.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettingsData {
    // raw anemometer units per m/s
    pub anemometer_coefficient: f32,
    pub temp_interval_ticks: u32,
    pub pressure_interval_ticks: u32,
}

impl Default for SettingsData {
    fn default() -> Self {
        Self {
            anemometer_coefficient: global_settings::DEFAULT_ANEMOMETER_COEFFICIENT,
            temp_interval_ticks: global_settings::DEFAULT_TEMP_INTERVAL_TICKS,
            pressure_interval_ticks: global_settings::DEFAULT_PRESSURE_INTERVAL_TICKS,
        }
    }
}

/// Sampling intervals which passed validation. The scheduler only accepts
/// this type, so a zero divisor can't reach the tick loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampleIntervals {
    pub temperature: NonZeroU32,
    pub pressure: NonZeroU32,
}

impl SettingsData {
    pub const SCHEMA_SIZE: u16 = size_of::<SettingsData>() as u16;

    pub fn validate(&self) -> Result<SampleIntervals, SettingsError> {
        if !(self.anemometer_coefficient.is_finite() && self.anemometer_coefficient > 0.0) {
            return Err(SettingsError::InvalidCoefficient(self.anemometer_coefficient));
        }

        let temperature = NonZeroU32::new(self.temp_interval_ticks)
            .ok_or(SettingsError::ZeroInterval(Channel::Temperature))?;
        let pressure = NonZeroU32::new(self.pressure_interval_ticks)
            .ok_or(SettingsError::ZeroInterval(Channel::Pressure))?;

        Ok(SampleIntervals {
            temperature,
            pressure,
        })
    }

    /// Repairs values which would break the tick loop: zero intervals are
    /// raised to one tick, an unusable coefficient is replaced by the
    /// factory calibration.
    pub fn sanitized(mut self) -> (Self, SampleIntervals) {
        if let Err(SettingsError::InvalidCoefficient(k)) = self.validate() {
            warn!(
                "anemometer coefficient {} is invalid, using {}",
                k,
                global_settings::DEFAULT_ANEMOMETER_COEFFICIENT
            );
            self.anemometer_coefficient = global_settings::DEFAULT_ANEMOMETER_COEFFICIENT;
        }

        let temperature = clamp_interval(Channel::Temperature, &mut self.temp_interval_ticks);
        let pressure = clamp_interval(Channel::Pressure, &mut self.pressure_interval_ticks);

        (
            self,
            SampleIntervals {
                temperature,
                pressure,
            },
        )
    }
}

fn clamp_interval(channel: Channel, ticks: &mut u32) -> NonZeroU32 {
    match NonZeroU32::new(*ticks) {
        Some(interval) => interval,
        None => {
            warn!("{} interval of 0 ticks, sampling every tick", channel);
            *ticks = 1;
            NonZeroU32::MIN
        }
    }
}

// Persisted record: size tag (u16, little endian) followed by the postcard
// encoded settings.
pub const SIZE_TAG_OFFSET: usize = 0;
pub const PAYLOAD_OFFSET: usize = SIZE_TAG_OFFSET + size_of::<u16>();
// f32 is encoded with 4 bytes, u32 varints take up to 5 bytes
pub const PAYLOAD_MAX_SIZE: usize = 4 + 5 + 5;
pub const SETTINGS_REGION_SIZE: usize = PAYLOAD_OFFSET + PAYLOAD_MAX_SIZE;

const _: () = assert!(SETTINGS_REGION_SIZE >= PAYLOAD_OFFSET + size_of::<SettingsData>());

pub struct SettingsStore<S> {
    storage: S,
}

impl<S: SettingsStorage> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Reads the persisted settings.
    ///
    /// The payload is only decoded if the size tag matches the compiled
    /// layout, everything else (blank storage, older firmware, read errors)
    /// silently yields the compiled defaults.
    pub fn load(&mut self) -> SettingsData {
        let size_tag = match self.storage.get_u16(SIZE_TAG_OFFSET) {
            Ok(tag) => tag,
            Err(e) => {
                warn!("reading settings size tag failed: {}, using defaults", e);
                return SettingsData::default();
            }
        };

        if size_tag != SettingsData::SCHEMA_SIZE {
            info!(
                "stored settings size {} differs from {}, using defaults",
                size_tag,
                SettingsData::SCHEMA_SIZE
            );
            return SettingsData::default();
        }

        let mut payload = [0; PAYLOAD_MAX_SIZE];
        if let Err(e) = self.storage.read(PAYLOAD_OFFSET, &mut payload) {
            warn!("reading settings payload failed: {}, using defaults", e);
            return SettingsData::default();
        }

        match postcard::from_bytes::<SettingsData>(&payload) {
            Ok(settings) => {
                debug!("loaded settings {:?}", settings);
                settings
            }
            Err(e) => {
                warn!("settings payload unreadable: {:?}, using defaults", e);
                SettingsData::default()
            }
        }
    }

    /// [`load`](Self::load) followed by [`SettingsData::sanitized`], used at
    /// startup before the first tick.
    pub fn load_validated(&mut self) -> (SettingsData, SampleIntervals) {
        self.load().sanitized()
    }

    /// Persists `settings`. The size tag and the payload are committed one
    /// after the other, a failure of either is returned without retry.
    pub fn save(&mut self, settings: &SettingsData) -> Result<(), StoreError> {
        let mut buf = [0; PAYLOAD_MAX_SIZE];
        let payload = postcard::to_slice(settings, &mut buf)?;

        self.storage
            .set_u16(SIZE_TAG_OFFSET, SettingsData::SCHEMA_SIZE)?;
        self.storage.commit()?;

        self.storage.write(PAYLOAD_OFFSET, payload)?;
        self.storage.commit()?;

        info!("settings saved {:?}", settings);
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}
