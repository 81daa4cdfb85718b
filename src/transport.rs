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
use crate::state::TelemetrySnapshot;

/// Request handling side of the node (HTTP server, serial console, ...).
///
/// Between two ticks the main loop repeatedly hands the latest snapshot to
/// [`serve`](Transport::serve). An implementation waits for the next
/// request, answers it from the snapshot and returns. The call is dropped
/// when the next tick is due, so it must not keep state across an `.await`
/// that can't be resumed by a fresh call.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn serve(&mut self, snapshot: &TelemetrySnapshot);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    async fn serve(&mut self, snapshot: &TelemetrySnapshot) {
        (**self).serve(snapshot).await
    }
}
