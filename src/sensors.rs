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
// Driver side of the measurement channels. The node only depends on these
// traits, the bus protocol of the barometer and the ADC setup of the
// anemometer stay with the board support code.

/// Temperature and pressure sensor (BMP280 class device).
pub trait Barometer {
    /// Initialises the device. Called once at startup, a `false` disables
    /// the temperature and pressure channels until the next reset.
    fn probe(&mut self) -> bool;

    /// [°C]
    fn read_temperature(&mut self) -> f32;

    /// [Pa]
    fn read_pressure(&mut self) -> f32;
}

/// Analog anemometer input.
pub trait WindSensor {
    /// Raw ADC reading, converted to m/s with the anemometer coefficient.
    fn read_raw(&mut self) -> u16;
}

impl<T: Barometer + ?Sized> Barometer for &mut T {
    fn probe(&mut self) -> bool {
        (**self).probe()
    }

    fn read_temperature(&mut self) -> f32 {
        (**self).read_temperature()
    }

    fn read_pressure(&mut self) -> f32 {
        (**self).read_pressure()
    }
}

impl<T: WindSensor + ?Sized> WindSensor for &mut T {
    fn read_raw(&mut self) -> u16 {
        (**self).read_raw()
    }
}
