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
use crate::data_processing::{WindSampleRing, WindStatistics};
use crate::global_settings::PASCAL_TO_MMHG;
use crate::sensors::{Barometer, WindSensor};
use crate::settings::SampleIntervals;
use crate::state::MeasuredData;
use log::*;

/// Tick counter driving the divisor based sampling.
///
/// It wraps to 0 once it passes `ceiling` instead of at the integer limit,
/// which keeps the `counter mod interval` schedule stable for the common
/// interval values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IterationCounter {
    value: u16,
    ceiling: u16,
}

impl IterationCounter {
    pub const fn new(ceiling: u16) -> Self {
        Self { value: 0, ceiling }
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn ceiling(&self) -> u16 {
        self.ceiling
    }

    pub fn advance(&mut self) {
        self.value = if self.value >= self.ceiling {
            0
        } else {
            self.value + 1
        };
    }
}

/// Channels sampled during one tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Acquisitions {
    pub temperature: bool,
    pub pressure: bool,
    pub wind: bool,
}

pub struct SampleScheduler<B, W> {
    barometer: B,
    wind_sensor: W,
    barometer_present: bool,
}

impl<B: Barometer, W: WindSensor> SampleScheduler<B, W> {
    /// Probes the barometer once. If it is missing, temperature and
    /// pressure stay at their last value for the lifetime of the process.
    pub fn new(mut barometer: B, wind_sensor: W) -> Self {
        let barometer_present = barometer.probe();
        if barometer_present {
            info!("barometer initialized");
        } else {
            warn!("barometer not found, temperature and pressure disabled");
        }

        Self {
            barometer,
            wind_sensor,
            barometer_present,
        }
    }

    pub fn barometer_present(&self) -> bool {
        self.barometer_present
    }

    pub fn barometer(&self) -> &B {
        &self.barometer
    }

    /// Channels due at `iteration`. Wind is sampled on every tick.
    pub fn due(&self, iteration: u16, intervals: &SampleIntervals) -> Acquisitions {
        let iteration = u32::from(iteration);

        Acquisitions {
            temperature: self.barometer_present && iteration % intervals.temperature.get() == 0,
            pressure: self.barometer_present && iteration % intervals.pressure.get() == 0,
            wind: true,
        }
    }

    /// Reads every channel due at `iteration` and stores the values in
    /// `measured`. Channels which are not due keep their previous value.
    pub fn sample<const N: usize>(
        &mut self,
        iteration: u16,
        intervals: &SampleIntervals,
        anemometer_coefficient: f32,
        wind_history: &mut WindSampleRing<N>,
        measured: &mut MeasuredData,
    ) -> Acquisitions {
        let due = self.due(iteration, intervals);

        if due.temperature {
            measured.temperature = self.barometer.read_temperature();
        }
        if due.pressure {
            measured.pressure = self.barometer.read_pressure() * PASCAL_TO_MMHG;
        }

        let raw = self.wind_sensor.read_raw();
        wind_history.record_sample(iteration, f32::from(raw), anemometer_coefficient);
        measured.wind_speed = wind_history.avg_speed();
        measured.wind_gust = wind_history.gust_speed();

        due
    }
}
