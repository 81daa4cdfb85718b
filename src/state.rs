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
use core::fmt;
use serde::{Deserialize, Serialize};

/// Latest aggregate of all measurement channels.
///
/// Only the scheduler and the wind aggregator write to it, and only while a
/// tick is running. Fields of channels which did not fire in a tick keep
/// their previous value.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MeasuredData {
    // [°C]
    pub temperature: f32,
    // [mmHg]
    pub pressure: f32,
    // rolling average [m/s]
    pub wind_speed: f32,
    // maximum within the wind window [m/s]
    pub wind_gust: f32,
}

/// Read-only view of [`MeasuredData`] handed to the transport layer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(rename = "temp")]
    pub temperature: f32,
    pub pressure: f32,
    #[serde(rename = "wind")]
    pub wind_speed: f32,
    #[serde(rename = "gusts")]
    pub wind_gust: f32,
}

impl TelemetrySnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<MeasuredData> for TelemetrySnapshot {
    fn from(m: MeasuredData) -> Self {
        Self {
            temperature: m.temperature,
            pressure: m.pressure,
            wind_speed: m.wind_speed,
            wind_gust: m.wind_gust,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
    Connecting,
}

/// Measurement channels with a configurable sampling interval.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    Temperature,
    Pressure,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Pressure => write!(f, "pressure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_uses_wire_field_names() {
        let snapshot = TelemetrySnapshot::from(MeasuredData {
            temperature: 21.5,
            pressure: 750.25,
            wind_speed: 3.5,
            wind_gust: 7.0,
        });

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(json["temp"], 21.5);
        assert_eq!(json["pressure"], 750.25);
        assert_eq!(json["wind"], 3.5);
        assert_eq!(json["gusts"], 7.0);
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn snapshot_starts_zeroed() {
        let snapshot = TelemetrySnapshot::from(MeasuredData::default());
        assert_eq!(
            snapshot.to_json().unwrap(),
            r#"{"temp":0.0,"pressure":0.0,"wind":0.0,"gusts":0.0}"#
        );
    }
}
