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
use crate::configuration::NodeConfig;
use crate::data_processing::WindSampleRing;
use crate::errors::SettingsError;
use crate::global_settings::WIND_WINDOW_SAMPLES;
use crate::scheduler::{Acquisitions, IterationCounter, SampleScheduler};
use crate::sensors::{Barometer, WindSensor};
use crate::settings::{SampleIntervals, SettingsData, SettingsStore};
use crate::state::{LinkState, MeasuredData, TelemetrySnapshot};
use crate::storage::SettingsStorage;
use crate::transport::Transport;
use crate::watchdog::{ConnectivityWatchdog, Network, WatchdogEvent};
use embassy_futures::select::{select, Either};
use embassy_time::{Instant, Timer};
use embedded_hal::delay::DelayNs;
use log::*;

/// Everything the node needs at runtime: measurement state, active
/// settings, wind history and the collaborators.
///
/// The node is driven from a single thread. All writes happen inside
/// [`tick`](Self::tick), readers only ever see the result of the last
/// completed tick.
pub struct TelemetryNode<S, B, W, N, D, const CAP: usize = WIND_WINDOW_SAMPLES> {
    config: NodeConfig,
    store: SettingsStore<S>,
    settings: SettingsData,
    intervals: SampleIntervals,
    measured: MeasuredData,
    wind_history: WindSampleRing<CAP>,
    counter: IterationCounter,
    scheduler: SampleScheduler<B, W>,
    watchdog: ConnectivityWatchdog<N, D>,
}

impl<S, B, W, N, D, const CAP: usize> TelemetryNode<S, B, W, N, D, CAP>
where
    S: SettingsStorage,
    B: Barometer,
    W: WindSensor,
    N: Network,
    D: DelayNs,
{
    /// Loads the persisted settings and probes the barometer. The network
    /// is not touched before [`start`](Self::start).
    pub fn new(
        config: NodeConfig,
        storage: S,
        barometer: B,
        wind_sensor: W,
        network: N,
        delay: D,
    ) -> Self {
        let mut store = SettingsStore::new(storage);
        let (settings, intervals) = store.load_validated();
        info!("active settings {:?}", settings);

        let watchdog = ConnectivityWatchdog::new(
            network,
            delay,
            config.credentials.clone(),
            config.watchdog,
        );

        Self {
            counter: IterationCounter::new(config.iteration_ceiling),
            config,
            store,
            settings,
            intervals,
            measured: MeasuredData::default(),
            wind_history: WindSampleRing::new(),
            scheduler: SampleScheduler::new(barometer, wind_sensor),
            watchdog,
        }
    }

    pub fn start(&mut self) -> WatchdogEvent {
        self.watchdog.connect()
    }

    /// One iteration of the main loop.
    pub fn tick(&mut self, now: Instant) -> Acquisitions {
        self.watchdog.poll(now);

        let iteration = self.counter.value();
        let acquisitions = self.scheduler.sample(
            iteration,
            &self.intervals,
            self.settings.anemometer_coefficient,
            &mut self.wind_history,
            &mut self.measured,
        );

        debug!(
            "#{} wind {:.2} m/s, gust {:.2} m/s, {:.1} °C, {:.1} mmHg",
            iteration,
            self.measured.wind_speed,
            self.measured.wind_gust,
            self.measured.temperature,
            self.measured.pressure
        );

        self.counter.advance();
        acquisitions
    }

    /// Runs one tick and serves requests until `tick_start + tick_period`.
    /// Returns the start of the next tick.
    pub async fn cycle<T: Transport>(&mut self, transport: &mut T, tick_start: Instant) -> Instant {
        self.tick(Instant::now());

        let next_tick = tick_start + self.config.tick_period;
        let snapshot = self.current_snapshot();
        loop {
            match select(Timer::at(next_tick), transport.serve(&snapshot)).await {
                Either::First(_) => break,
                Either::Second(_) => {}
            }
        }

        // don't try to catch up on ticks lost to a slow tick
        next_tick.max(Instant::now())
    }

    pub async fn run<T: Transport>(&mut self, transport: &mut T) {
        let mut tick_start = Instant::now();
        loop {
            tick_start = self.cycle(transport, tick_start).await;
        }
    }

    /// Validates and persists `settings`, and activates them once they are
    /// stored. On any error the previous settings stay active.
    pub fn update_settings(&mut self, settings: SettingsData) -> Result<(), SettingsError> {
        let intervals = settings.validate()?;
        self.store.save(&settings)?;

        self.settings = settings;
        self.intervals = intervals;
        info!("settings updated {:?}", settings);
        Ok(())
    }

    pub fn current_snapshot(&self) -> TelemetrySnapshot {
        self.measured.into()
    }

    pub fn measured(&self) -> &MeasuredData {
        &self.measured
    }

    pub fn settings(&self) -> &SettingsData {
        &self.settings
    }

    pub fn iteration(&self) -> u16 {
        self.counter.value()
    }

    pub fn wind_history(&self) -> &WindSampleRing<CAP> {
        &self.wind_history
    }

    pub fn link_state(&self) -> LinkState {
        self.watchdog.state()
    }

    pub fn network(&self) -> &N {
        self.watchdog.network()
    }

    pub fn network_mut(&mut self) -> &mut N {
        self.watchdog.network_mut()
    }

    pub fn store(&self) -> &SettingsStore<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::settings::SETTINGS_REGION_SIZE;
    use crate::state::Channel;
    use crate::storage::MemoryStorage;
    use crate::watchdog::{Credentials, LinkStatus, WatchdogConfig};
    use embassy_futures::block_on;
    use embassy_time::Duration;

    struct StubBarometer {
        present: bool,
        temperature_reads: u32,
    }

    impl Barometer for StubBarometer {
        fn probe(&mut self) -> bool {
            self.present
        }

        fn read_temperature(&mut self) -> f32 {
            self.temperature_reads += 1;
            18.5
        }

        fn read_pressure(&mut self) -> f32 {
            101_325.0
        }
    }

    struct ScriptedWind {
        readings: Vec<u16>,
        next: usize,
    }

    impl WindSensor for ScriptedWind {
        fn read_raw(&mut self) -> u16 {
            let raw = self.readings[self.next % self.readings.len()];
            self.next += 1;
            raw
        }
    }

    #[derive(Default)]
    struct StubNetwork {
        link_up: bool,
        accept: bool,
        starts: u32,
        stops: u32,
    }

    impl Network for StubNetwork {
        fn status(&mut self) -> LinkStatus {
            if self.link_up {
                LinkStatus::Connected
            } else {
                LinkStatus::Disconnected
            }
        }

        fn begin_connection(&mut self, _: &Credentials) -> LinkStatus {
            self.link_up = self.accept;
            self.status()
        }

        fn stop_endpoint(&mut self) {
            self.stops += 1;
        }

        fn start_endpoint(&mut self) {
            self.starts += 1;
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _: u32) {}
    }

    #[derive(Default)]
    struct CountingTransport {
        pending_requests: u32,
        served: Vec<TelemetrySnapshot>,
    }

    impl Transport for CountingTransport {
        async fn serve(&mut self, snapshot: &TelemetrySnapshot) {
            if self.pending_requests == 0 {
                core::future::pending::<()>().await;
            }
            self.pending_requests -= 1;
            self.served.push(*snapshot);
        }
    }

    type Storage = MemoryStorage<SETTINGS_REGION_SIZE>;
    type TestNode<'a> =
        TelemetryNode<&'a mut Storage, StubBarometer, ScriptedWind, StubNetwork, NoDelay, 4>;

    fn config(iteration_ceiling: u16) -> NodeConfig {
        NodeConfig {
            tick_period: Duration::from_millis(50),
            iteration_ceiling,
            watchdog: WatchdogConfig {
                check_interval: Duration::from_millis(1000),
                reconnect_attempts: 3,
                reconnect_delay_ms: 0,
            },
            credentials: Credentials::new("weather", "secret").unwrap(),
        }
    }

    fn node(storage: &mut Storage, iteration_ceiling: u16, readings: Vec<u16>) -> TestNode<'_> {
        TelemetryNode::new(
            config(iteration_ceiling),
            storage,
            StubBarometer {
                present: true,
                temperature_reads: 0,
            },
            ScriptedWind { readings, next: 0 },
            StubNetwork {
                accept: true,
                ..Default::default()
            },
            NoDelay,
        )
    }

    fn settings(temp_interval_ticks: u32) -> SettingsData {
        SettingsData {
            anemometer_coefficient: 1.0,
            temp_interval_ticks,
            pressure_interval_ticks: 2,
        }
    }

    #[test]
    fn blank_storage_starts_with_defaults() {
        let mut storage = Storage::new();
        let node = node(&mut storage, 100, vec![0]);

        assert_eq!(*node.settings(), SettingsData::default());
        assert_eq!(node.current_snapshot(), TelemetrySnapshot::default());
    }

    #[test]
    fn persisted_settings_are_picked_up() {
        let mut storage = Storage::new();
        SettingsStore::new(&mut storage).save(&settings(7)).unwrap();

        let node = node(&mut storage, 100, vec![0]);

        assert_eq!(*node.settings(), settings(7));
    }

    #[test]
    fn ticks_aggregate_wind_and_schedule_temperature() {
        let mut storage = Storage::new();
        let mut node = node(&mut storage, 100, vec![2, 5, 1]);
        node.update_settings(settings(2)).unwrap();

        let fired: Vec<bool> = (0..3)
            .map(|ms| node.tick(Instant::from_millis(ms)).temperature)
            .collect();

        assert_eq!(fired, vec![true, false, true]);
        assert_eq!(node.barometer_reads(), 2);
        let snapshot = node.current_snapshot();
        assert_eq!(snapshot.wind_gust, 5.0);
        assert!((snapshot.wind_speed - 8.0 / 3.0).abs() < 1e-4);
        assert_eq!(snapshot.temperature, 18.5);
        assert!((snapshot.pressure - 760.0).abs() < 0.1);
        assert_eq!(TelemetrySnapshot::from(*node.measured()), snapshot);
        assert_eq!(node.iteration(), 3);
    }

    #[test]
    fn counter_wrap_keeps_history_and_settings() {
        let mut storage = Storage::new();
        let mut node = node(&mut storage, 2, vec![4]);
        node.update_settings(settings(3)).unwrap();

        for ms in 0..3 {
            node.tick(Instant::from_millis(ms));
        }
        assert_eq!(node.iteration(), 0);
        assert_eq!(node.wind_history().fill_count(), 3);

        node.tick(Instant::from_millis(3));
        assert_eq!(node.iteration(), 1);
        assert_eq!(node.wind_history().fill_count(), 3);
        assert_eq!(node.current_snapshot().wind_speed, 4.0);
        assert_eq!(*node.settings(), settings(3));
    }

    #[test]
    fn zero_interval_update_is_rejected() {
        let mut storage = Storage::new();
        let mut node = node(&mut storage, 100, vec![0]);

        assert_eq!(
            node.update_settings(settings(0)),
            Err(SettingsError::ZeroInterval(Channel::Temperature))
        );
        assert_eq!(*node.settings(), SettingsData::default());
        assert_eq!(node.store().storage().committed(), &[0; SETTINGS_REGION_SIZE]);
    }

    #[test]
    fn failed_save_keeps_previous_settings() {
        let mut storage = Storage::new().fail_from_write(0);
        let mut node = node(&mut storage, 100, vec![0]);

        assert_eq!(
            node.update_settings(settings(5)),
            Err(SettingsError::Store(StoreError::Io(std::io::ErrorKind::Other)))
        );
        assert_eq!(*node.settings(), SettingsData::default());
    }

    #[test]
    fn start_connects_and_tick_recovers_lost_link() {
        let mut storage = Storage::new();
        let mut node = node(&mut storage, 100, vec![0]);

        node.start();
        assert_eq!(node.link_state(), LinkState::Connected);
        assert_eq!(node.network().starts, 1);

        node.network_mut().link_up = false;
        node.tick(Instant::from_millis(0));

        assert_eq!(node.link_state(), LinkState::Connected);
        assert_eq!(node.network().stops, 2);
        assert_eq!(node.network().starts, 2);
    }

    #[test]
    fn lost_link_keeps_last_snapshot() {
        let mut storage = Storage::new();
        let mut node = node(&mut storage, 100, vec![3]);
        node.start();
        node.tick(Instant::from_millis(0));
        let before = node.current_snapshot();

        let network = node.network_mut();
        network.link_up = false;
        network.accept = false;
        node.tick(Instant::from_millis(1000));

        assert_eq!(node.link_state(), LinkState::Disconnected);
        assert_eq!(node.current_snapshot().wind_gust, before.wind_gust);
        assert_eq!(node.current_snapshot().wind_speed, before.wind_speed);
    }

    #[test]
    fn cycle_serves_snapshot_of_completed_tick() {
        let mut storage = Storage::new();
        let mut node = node(&mut storage, 100, vec![6]);
        let mut transport = CountingTransport {
            pending_requests: 2,
            ..Default::default()
        };

        let tick_start = Instant::now();
        let next_tick = block_on(node.cycle(&mut transport, tick_start));

        assert!(next_tick >= tick_start + Duration::from_millis(50));
        assert_eq!(transport.served.len(), 2);
        assert!(transport
            .served
            .iter()
            .all(|s| *s == node.current_snapshot()));
        assert_eq!(node.iteration(), 1);
    }

    impl<'a> TestNode<'a> {
        fn barometer_reads(&self) -> u32 {
            self.scheduler.barometer().temperature_reads
        }
    }
}
