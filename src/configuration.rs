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
use crate::errors::InitError;
use crate::watchdog::{Credentials, WatchdogConfig};
use embassy_time::Duration;

// Build time configuration, values are taken from `cfg.toml` in the crate
// root (section `[telemetry-node]`) and fall back to the defaults below.
#[toml_cfg::toml_config]
pub struct Config {
    #[default("")]
    wifi_ssid: &'static str,
    #[default("")]
    wifi_psk: &'static str,
    // tick cadence of the sampling loop [ms]
    #[default(1000)]
    tick_period_ms: u64,
    // link check interval of the connectivity watchdog [ms]
    #[default(1000)]
    wifi_check_interval_ms: u64,
    #[default(20)]
    reconnect_attempts: u8,
    // pause after each connection attempt [ms]
    #[default(300)]
    reconnect_delay_ms: u32,
    // the iteration counter wraps to 0 once it passes this value
    #[default(65530)]
    iteration_ceiling: u16,
    // settings region of the host build
    #[default("settings.bin")]
    settings_path: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    pub tick_period: Duration,
    pub iteration_ceiling: u16,
    pub watchdog: WatchdogConfig,
    pub credentials: Credentials,
}

impl NodeConfig {
    /// Configuration compiled into the binary, including the WiFi
    /// credentials.
    pub fn from_build_config() -> Result<Self, InitError> {
        Ok(Self {
            credentials: Credentials::new(CONFIG.wifi_ssid, CONFIG.wifi_psk)?,
            ..Self::default()
        })
    }
}

impl Default for NodeConfig {
    /// Build time timing values without credentials.
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(CONFIG.tick_period_ms),
            iteration_ceiling: CONFIG.iteration_ceiling,
            watchdog: WatchdogConfig {
                check_interval: Duration::from_millis(CONFIG.wifi_check_interval_ms),
                reconnect_attempts: CONFIG.reconnect_attempts,
                reconnect_delay_ms: CONFIG.reconnect_delay_ms,
            },
            credentials: Credentials::default(),
        }
    }
}

pub fn settings_path() -> &'static str {
    CONFIG.settings_path
}
