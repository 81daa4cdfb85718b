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
//! Core of a weather telemetry node.
//!
//! Samples temperature, pressure and wind speed at independent cadences,
//! keeps a rolling wind history for average and gust, persists its
//! calibration across power cycles and keeps the network link alive. The
//! sensor drivers, the network stack and the request transport are
//! collaborators behind the traits in [`sensors`], [`watchdog`] and
//! [`transport`].

pub mod configuration;
pub mod data_processing;
pub mod errors;
pub mod global_settings;
pub mod node;
pub mod scheduler;
pub mod sensors;
pub mod settings;
pub mod state;
pub mod storage;
pub mod transport;
pub mod watchdog;

pub use configuration::NodeConfig;
pub use node::TelemetryNode;
pub use settings::{SettingsData, SettingsStore};
pub use state::{MeasuredData, TelemetrySnapshot};
