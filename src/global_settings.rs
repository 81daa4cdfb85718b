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
// Number of wind samples kept for average and gust calculation. With the
// default 1 sec tick this is a little more than 3 min of wind history.
pub const WIND_WINDOW_SAMPLES: usize = 200;

// Factory calibration of the anemometer: raw ADC units per m/s
pub const DEFAULT_ANEMOMETER_COEFFICIENT: f32 = 15.3925;
// Temperature is sampled every n-th tick
pub const DEFAULT_TEMP_INTERVAL_TICKS: u32 = 60;
// Pressure is sampled every n-th tick
pub const DEFAULT_PRESSURE_INTERVAL_TICKS: u32 = 60;

// The barometer reports Pa, the node reports mmHg
pub const PASCAL_TO_MMHG: f32 = 0.007_500_615;
