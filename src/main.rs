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
use embassy_time::Duration;
use log::*;
use telemetry_node::configuration::{self, NodeConfig};
use telemetry_node::settings::SETTINGS_REGION_SIZE;
use telemetry_node::storage::FileStorage;
use telemetry_node::watchdog::TimerDelay;
use telemetry_node::TelemetryNode;

mod simulator;

use simulator::*;

// simulated clients poll the endpoint at this rate
const REQUEST_INTERVAL: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = NodeConfig::from_build_config()?;
    if config.credentials.ssid().is_empty() {
        warn!("no WiFi SSID configured, check cfg.toml");
    }

    let storage = FileStorage::open(configuration::settings_path(), SETTINGS_REGION_SIZE)?;
    info!("settings stored in {}", storage.path().display());

    let mut node: TelemetryNode<_, _, _, _, _> = TelemetryNode::new(
        config,
        storage,
        SimulatedBarometer::default(),
        SimulatedWindSensor::default(),
        SimulatedLink::default(),
        TimerDelay,
    );

    let event = node.start();
    info!("startup: {:?}", event);

    let mut transport = LogTransport::new(REQUEST_INTERVAL);
    embassy_futures::block_on(node.run(&mut transport));

    Ok(())
}
