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
// Wind history of the node. One sample is written every tick into the slot
// selected by the iteration counter, so the ring holds the last N ticks of
// wind speed in m/s. Average and gust are recomputed by a full scan after
// every write:
//
// - the average only counts slots which received a real sample, so the
//   first minutes after a power cycle are not dragged down by empty slots
// - the gust is the maximum over all slots, empty slots count as 0 m/s, so
//   the reported gust is never negative
pub struct WindSampleRing<const N: usize> {
    samples: [f32; N],
    // number of leading slots which have received a sample
    filled: usize,
    avg_speed: f32,
    gust: f32,
}

impl<const N: usize> WindSampleRing<N> {
    const NON_EMPTY: () = assert!(N > 0, "wind ring needs at least one slot");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;

        Self {
            samples: [0.0; N],
            filled: 0,
            avg_speed: 0.0,
            gust: 0.0,
        }
    }

    /// Converts a raw anemometer reading into m/s, stores it in slot
    /// `iteration mod N` and updates average and gust.
    ///
    /// `coefficient` must be a positive calibration factor, settings are
    /// validated before they reach the aggregator.
    pub fn record_sample(&mut self, iteration: u16, raw_sensor_units: f32, coefficient: f32) {
        let slot = usize::from(iteration) % N;
        self.samples[slot] = raw_sensor_units / coefficient;
        self.filled = self.filled.max(slot + 1);

        self.recompute();
    }

    pub fn fill_count(&self) -> usize {
        self.filled
    }

    pub fn slot(&self, index: usize) -> Option<f32> {
        self.samples.get(index).copied()
    }

    fn recompute(&mut self) {
        let mut max = 0.0_f32;
        let mut sum = 0.0_f32;

        for (i, &speed) in self.samples.iter().enumerate() {
            if speed > max {
                max = speed;
            }
            if i < self.filled {
                sum += speed;
            }
        }

        self.gust = max;
        if self.filled > 0 {
            self.avg_speed = sum / self.filled as f32;
        }
    }
}

impl<const N: usize> Default for WindSampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

pub trait WindStatistics {
    fn avg_speed(&self) -> f32;

    fn gust_speed(&self) -> f32;

    fn sample_count(&self) -> usize;
}

impl<const N: usize> WindStatistics for WindSampleRing<N> {
    fn avg_speed(&self) -> f32 {
        self.avg_speed
    }

    fn gust_speed(&self) -> f32 {
        self.gust
    }

    fn sample_count(&self) -> usize {
        self.filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn gust_is_zero_before_first_sample() {
        let wind_data = WindSampleRing::<5>::new();

        assert_eq!(wind_data.gust_speed(), 0.0);
        assert_eq!(wind_data.avg_speed(), 0.0);
        assert_eq!(wind_data.sample_count(), 0);
    }

    #[test]
    fn first_sample_is_the_average() {
        let mut wind_data = WindSampleRing::<5>::new();

        wind_data.record_sample(0, 4.0, 1.0);

        assert_eq!(wind_data.avg_speed(), 4.0);
        assert_eq!(wind_data.gust_speed(), 4.0);
    }

    #[test]
    fn average_counts_filled_slots_only() {
        let mut wind_data = WindSampleRing::<5>::new();
        let mut gusts = Vec::new();
        let mut averages = Vec::new();

        for (iteration, raw) in [2.0, 5.0, 1.0].into_iter().enumerate() {
            wind_data.record_sample(iteration as u16, raw, 1.0);
            gusts.push(wind_data.gust_speed());
            averages.push(wind_data.avg_speed());
        }

        assert_eq!(gusts, vec![2.0, 5.0, 5.0]);
        assert_close(averages[0], 2.0);
        assert_close(averages[1], 3.5);
        assert_close(averages[2], 2.667);
    }

    #[test]
    fn raw_units_are_scaled_by_coefficient() {
        let mut wind_data = WindSampleRing::<4>::new();

        wind_data.record_sample(0, 153.925, 15.3925);

        assert_close(wind_data.avg_speed(), 10.0);
        assert_close(wind_data.gust_speed(), 10.0);
    }

    #[test]
    fn wrap_around_overwrites_oldest_slot() {
        const CAPACITY: usize = 4;
        let mut wind_data = WindSampleRing::<CAPACITY>::new();
        let k = 3;

        for iteration in 0..(CAPACITY + k) {
            wind_data.record_sample(iteration as u16, (iteration + 1) as f32, 1.0);
        }

        // latest write was sample number CAPACITY + k
        assert_eq!(wind_data.slot(k - 1), Some((CAPACITY + k) as f32));
        assert_eq!(wind_data.sample_count(), CAPACITY);
        // slots hold 5, 6, 7, 4
        assert_close(wind_data.avg_speed(), (5.0 + 6.0 + 7.0 + 4.0) / 4.0);
    }

    #[test]
    fn gust_ages_out_when_its_slot_is_overwritten() {
        let mut wind_data = WindSampleRing::<3>::new();

        wind_data.record_sample(0, 9.0, 1.0);
        wind_data.record_sample(1, 1.0, 1.0);
        wind_data.record_sample(2, 1.0, 1.0);
        assert_eq!(wind_data.gust_speed(), 9.0);

        wind_data.record_sample(3, 2.0, 1.0);
        assert_eq!(wind_data.gust_speed(), 2.0);
    }

    #[test]
    fn negative_samples_do_not_produce_negative_gust() {
        let mut wind_data = WindSampleRing::<3>::new();

        wind_data.record_sample(0, -3.0, 1.0);
        wind_data.record_sample(1, -1.0, 1.0);

        assert_eq!(wind_data.gust_speed(), 0.0);
        assert_close(wind_data.avg_speed(), -2.0);
    }

    #[test]
    fn counter_restart_keeps_history() {
        let mut wind_data = WindSampleRing::<4>::new();

        for iteration in 0..6_u16 {
            wind_data.record_sample(iteration, 1.0, 1.0);
        }
        // iteration counter wrapped back to zero
        wind_data.record_sample(0, 5.0, 1.0);

        assert_eq!(wind_data.sample_count(), 4);
        assert_close(wind_data.avg_speed(), 2.0);
        assert_eq!(wind_data.gust_speed(), 5.0);
    }

    proptest! {
        #[test]
        fn statistics_match_naive_window(samples in prop::collection::vec(0.0f32..100.0, 1..40)) {
            const CAPACITY: usize = 8;
            let mut wind_data = WindSampleRing::<CAPACITY>::new();
            let mut model = [0.0_f32; CAPACITY];

            for (iteration, &raw) in samples.iter().enumerate() {
                wind_data.record_sample(iteration as u16, raw, 1.0);
                model[iteration % CAPACITY] = raw;
            }

            let filled = samples.len().min(CAPACITY);
            let expected_avg = model[..filled].iter().sum::<f32>() / filled as f32;
            let expected_gust = model.iter().cloned().fold(0.0_f32, f32::max);

            prop_assert_eq!(wind_data.sample_count(), filled);
            prop_assert!((wind_data.avg_speed() - expected_avg).abs() < 1e-2);
            prop_assert_eq!(wind_data.gust_speed(), expected_gust);
        }
    }
}
