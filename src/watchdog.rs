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
use crate::state::LinkState;
use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use log::*;

pub const WIFI_SSID_MAX: usize = 32;
pub const WIFI_PASSWORD_MAX: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    Disconnected,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    ssid: heapless::String<WIFI_SSID_MAX>,
    password: heapless::String<WIFI_PASSWORD_MAX>,
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, InitError> {
        let mut credentials = Self::default();
        credentials
            .ssid
            .push_str(ssid)
            .map_err(|_| InitError::CredentialsTooLong)?;
        credentials
            .password
            .push_str(password)
            .map_err(|_| InitError::CredentialsTooLong)?;
        Ok(credentials)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Network stack and the request handling endpoint riding on it.
pub trait Network {
    fn status(&mut self) -> LinkStatus;

    /// One connection attempt.
    fn begin_connection(&mut self, credentials: &Credentials) -> LinkStatus;

    fn stop_endpoint(&mut self);

    fn start_endpoint(&mut self);
}

impl<T: Network + ?Sized> Network for &mut T {
    fn status(&mut self) -> LinkStatus {
        (**self).status()
    }

    fn begin_connection(&mut self, credentials: &Credentials) -> LinkStatus {
        (**self).begin_connection(credentials)
    }

    fn stop_endpoint(&mut self) {
        (**self).stop_endpoint()
    }

    fn start_endpoint(&mut self) {
        (**self).start_endpoint()
    }
}

/// Blocking delay on top of the embassy time driver.
#[derive(Copy, Clone, Debug, Default)]
pub struct TimerDelay;

impl DelayNs for TimerDelay {
    fn delay_ns(&mut self, ns: u32) {
        embassy_time::block_for(Duration::from_nanos(u64::from(ns)));
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub check_interval: Duration,
    pub reconnect_attempts: u8,
    pub reconnect_delay_ms: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WatchdogEvent {
    // check interval has not elapsed yet
    Idle,
    LinkHealthy,
    Reconnected { attempts: u8 },
    ReconnectFailed { attempts: u8 },
}

/// Keeps the node connected.
///
/// Every `check_interval` the link status is checked. A lost link stops
/// the endpoint and starts a bounded series of connection attempts; the
/// endpoint is only started again once an attempt succeeds. If all
/// attempts fail the node stays disconnected until the next check.
pub struct ConnectivityWatchdog<N, D> {
    network: N,
    delay: D,
    credentials: Credentials,
    config: WatchdogConfig,
    state: LinkState,
    next_check: Option<Instant>,
}

impl<N: Network, D: DelayNs> ConnectivityWatchdog<N, D> {
    pub fn new(network: N, delay: D, credentials: Credentials, config: WatchdogConfig) -> Self {
        Self {
            network,
            delay,
            credentials,
            config,
            state: LinkState::Disconnected,
            next_check: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    /// Initial connection at startup.
    pub fn connect(&mut self) -> WatchdogEvent {
        info!("connecting to WiFi {}", self.credentials.ssid());
        self.reconnect()
    }

    pub fn poll(&mut self, now: Instant) -> WatchdogEvent {
        if matches!(self.next_check, Some(next_check) if now < next_check) {
            return WatchdogEvent::Idle;
        }

        let event = match self.network.status() {
            LinkStatus::Connected if self.state == LinkState::Connected => {
                WatchdogEvent::LinkHealthy
            }
            LinkStatus::Connected => {
                // the stack came back on its own, the endpoint still
                // has to be brought up
                info!("WiFi link restored");
                self.state = LinkState::Connecting;
                self.on_connected(0)
            }
            LinkStatus::Disconnected => {
                info!("WiFi lost, trying reconnect");
                self.state = LinkState::Disconnected;
                self.reconnect()
            }
        };

        self.next_check = Some(now + self.config.check_interval);
        event
    }

    fn reconnect(&mut self) -> WatchdogEvent {
        // never serve requests over a dead link
        self.network.stop_endpoint();
        self.state = LinkState::Connecting;

        let attempts = self.config.reconnect_attempts.max(1);
        for attempt in 1..=attempts {
            let status = self.network.begin_connection(&self.credentials);
            self.delay.delay_ms(self.config.reconnect_delay_ms);

            if status == LinkStatus::Connected {
                return self.on_connected(attempt);
            }
            debug!("connection attempt {}/{} failed", attempt, attempts);
        }

        warn!("WiFi not connected after {} attempts", attempts);
        self.state = LinkState::Disconnected;
        WatchdogEvent::ReconnectFailed { attempts }
    }

    fn on_connected(&mut self, attempts: u8) -> WatchdogEvent {
        self.state = LinkState::Connected;
        self.network.start_endpoint();
        info!("WiFi connected, endpoint started");
        WatchdogEvent::Reconnected { attempts }
    }
}
