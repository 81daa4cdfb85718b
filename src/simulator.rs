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
// Stand-ins for the hardware collaborators so the node can run on a
// desktop. Readings follow slow sine waves with a bit of noise, the WiFi
// link drops every few minutes to exercise the watchdog.
use embassy_time::{Duration, Instant, Timer};
use log::*;
use telemetry_node::sensors::{Barometer, WindSensor};
use telemetry_node::transport::Transport;
use telemetry_node::watchdog::{Credentials, LinkStatus, Network};
use telemetry_node::TelemetrySnapshot;

// link drops after this many status checks
const LINK_DROP_PERIOD: u32 = 240;
// connection attempts failing after a drop
const FAILED_ATTEMPTS_AFTER_DROP: u32 = 3;

const BAROMETER_SEED: u64 = 0x2545_f491;
const WIND_SEED: u64 = 0x9e37_79b9;

fn elapsed_secs() -> f32 {
    Instant::now().as_millis() as f32 / 1000.0
}

pub struct SimulatedBarometer {
    rng: fastrand::Rng,
}

impl SimulatedBarometer {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    // [°C], 14-20 °C
    fn temperature_at(&mut self, t: f32) -> f32 {
        17.0 + 3.0 * (t / 600.0).sin() + 0.2 * self.rng.f32()
    }

    // [Pa], around 1013 hPa
    fn pressure_at(&mut self, t: f32) -> f32 {
        101_325.0 + 150.0 * (t / 1800.0).sin() + 5.0 * self.rng.f32()
    }
}

impl Default for SimulatedBarometer {
    fn default() -> Self {
        Self::with_seed(BAROMETER_SEED)
    }
}

impl Barometer for SimulatedBarometer {
    fn probe(&mut self) -> bool {
        true
    }

    fn read_temperature(&mut self) -> f32 {
        self.temperature_at(elapsed_secs())
    }

    fn read_pressure(&mut self) -> f32 {
        self.pressure_at(elapsed_secs())
    }
}

pub struct SimulatedWindSensor {
    rng: fastrand::Rng,
}

impl SimulatedWindSensor {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    // 0-1023 ADC range, gusty around 5 m/s with the factory coefficient
    fn raw_at(&mut self, t: f32) -> u16 {
        let base = 75.0 + 40.0 * (t / 90.0).sin();
        let gust = 120.0 * self.rng.f32().powi(4);
        (base + gust).clamp(0.0, 1023.0) as u16
    }
}

impl Default for SimulatedWindSensor {
    fn default() -> Self {
        Self::with_seed(WIND_SEED)
    }
}

impl WindSensor for SimulatedWindSensor {
    fn read_raw(&mut self) -> u16 {
        self.raw_at(elapsed_secs())
    }
}

#[derive(Default)]
pub struct SimulatedLink {
    connected: bool,
    status_checks: u32,
    failed_attempts: u32,
}

impl Network for SimulatedLink {
    fn status(&mut self) -> LinkStatus {
        self.status_checks += 1;
        if self.connected && self.status_checks % LINK_DROP_PERIOD == 0 {
            info!("simulated link: dropping connection");
            self.connected = false;
            self.failed_attempts = 0;
        }

        if self.connected {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    fn begin_connection(&mut self, credentials: &Credentials) -> LinkStatus {
        if self.failed_attempts < FAILED_ATTEMPTS_AFTER_DROP {
            self.failed_attempts += 1;
            return LinkStatus::Disconnected;
        }

        let security = if credentials.password().is_empty() {
            "open"
        } else {
            "WPA2"
        };
        info!("simulated link: joined {} ({})", credentials.ssid(), security);
        self.connected = true;
        LinkStatus::Connected
    }

    fn stop_endpoint(&mut self) {
        info!("simulated link: endpoint stopped");
    }

    fn start_endpoint(&mut self) {
        info!("simulated link: endpoint started");
    }
}

/// Answers one simulated request every `interval` by logging the JSON
/// document an HTTP client would receive.
pub struct LogTransport {
    interval: Duration,
    next_request: Instant,
}

impl LogTransport {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_request: Instant::now() + interval,
        }
    }
}

impl Transport for LogTransport {
    async fn serve(&mut self, snapshot: &TelemetrySnapshot) {
        Timer::at(self.next_request).await;
        self.next_request += self.interval;

        match snapshot.to_json() {
            Ok(json) => info!("GET / -> {}", json),
            Err(e) => warn!("failed to render snapshot: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_stay_in_plausible_range() {
        let mut barometer = SimulatedBarometer::default();
        let mut wind = SimulatedWindSensor::default();

        for t in (0..7200).step_by(7) {
            let t = t as f32;
            let temperature = barometer.temperature_at(t);
            let pressure = barometer.pressure_at(t);
            let raw = wind.raw_at(t);

            assert!((14.0..=20.2).contains(&temperature), "{temperature}");
            assert!((101_175.0..=101_480.0).contains(&pressure), "{pressure}");
            assert!((35..=235).contains(&raw), "{raw}");
        }
    }

    #[test]
    fn same_seed_replays_same_readings() {
        let mut a = SimulatedWindSensor::with_seed(7);
        let mut b = SimulatedWindSensor::with_seed(7);

        let a: Vec<u16> = (0..50).map(|t| a.raw_at(t as f32)).collect();
        let b: Vec<u16> = (0..50).map(|t| b.raw_at(t as f32)).collect();

        assert_eq!(a, b);
    }

    #[test]
    fn link_recovers_after_failed_attempts() {
        let mut link = SimulatedLink::default();
        let credentials = Credentials::new("weather", "secret").unwrap();

        let attempts: Vec<LinkStatus> = (0..=FAILED_ATTEMPTS_AFTER_DROP)
            .map(|_| link.begin_connection(&credentials))
            .collect();

        assert_eq!(attempts.last(), Some(&LinkStatus::Connected));
        assert!(attempts[..attempts.len() - 1]
            .iter()
            .all(|s| *s == LinkStatus::Disconnected));
        assert_eq!(link.status(), LinkStatus::Connected);
    }
}
