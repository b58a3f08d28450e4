//! Per-device animation
//!
//! An [`Animator`] owns the runtime configuration of one device and loops
//! forever: pick a target color, interpolate towards it while publishing a
//! frame every timestep, publish the exact target, then hold. The loop only
//! ends when its cancellation token fires.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use rand::{rngs::StdRng, SeedableRng};
use tokio::{
    select,
    task::JoinHandle,
    time::{interval_at, sleep, sleep_until, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing_error::SpanTrace;

use crate::{
    api::{ColorPayload, PayloadFormat},
    color::{clamp01, Color},
    methods::Publisher,
    runtime::RuntimeConfig,
};

/// Progress of the current transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    /// Color the transition starts from
    pub previous: Color,
    /// Target color
    pub next: Color,
    /// Start of the transition
    pub start: Instant,
    /// Instant the target is reached
    pub end: Instant,
}

impl AnimationState {
    /// Transition from `previous` to `next` lasting `duration`
    pub fn new(previous: Color, next: Color, start: Instant, duration: Duration) -> Self {
        Self {
            previous,
            next,
            start,
            end: start + duration,
        }
    }

    /// Color to publish at `now`, and the transition time the device should
    /// use to reach it
    ///
    /// The transition time is the time left until the end of the animation,
    /// capped to one timestep. The returned color is the one the animation
    /// reaches once that time has elapsed, so the device fades smoothly
    /// between two frames.
    pub fn frame(&self, now: Instant, timestep: Duration) -> (Color, Duration) {
        let transition = self.end.saturating_duration_since(now).min(timestep);
        let total = self.end.saturating_duration_since(self.start);

        let t = if total.is_zero() {
            1.0
        } else {
            let elapsed = now.saturating_duration_since(self.start);
            clamp01((elapsed + transition).as_secs_f64() / total.as_secs_f64())
        };

        (self.previous.lerp(&self.next, t), transition)
    }
}

/// Color loop of a single device
pub struct Animator {
    device: String,
    channel: String,
    config: RuntimeConfig,
    format: PayloadFormat,
    publisher: Arc<dyn Publisher>,
    rng: StdRng,
}

impl Animator {
    /// Animator publishing commands for `device` on `channel`
    pub fn new(
        device: String,
        channel: String,
        config: RuntimeConfig,
        format: PayloadFormat,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            device,
            channel,
            config,
            format,
            publisher,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Use a specific random generator, mostly for reproducible runs
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Friendly name of the animated device
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Run the animation until `token` is cancelled
    pub async fn run(mut self, token: CancellationToken) {
        let mut previous = self.config.select_color_now(&mut self.rng);

        loop {
            let next = self.config.select_color_now(&mut self.rng);
            let duration = self.config.transition(&mut self.rng);
            let state = AnimationState::new(previous, next, Instant::now(), duration);

            debug!(duration = ?duration, target = ?next, "starting transition");

            if !self.transition(&state, &token).await {
                return;
            }

            if token.is_cancelled() {
                return;
            }

            self.publish(&next, Duration::ZERO, &token).await;
            previous = next;

            let hold = self.config.hold(&mut self.rng);
            trace!(hold = ?hold, "holding");

            select! {
                biased;
                _ = token.cancelled() => return,
                _ = sleep(hold) => {},
            }
        }
    }

    /// Publish transition frames until the end of `state`
    ///
    /// Returns `false` if the animation was cancelled.
    async fn transition(&self, state: &AnimationState, token: &CancellationToken) -> bool {
        let timestep = self.config.timestep;

        let mut ticker = interval_at(state.start + timestep, timestep);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let deadline = sleep_until(state.end);
        tokio::pin!(deadline);

        if token.is_cancelled() {
            return false;
        }

        self.publish_frame(state, token).await;

        loop {
            select! {
                biased;
                _ = token.cancelled() => return false,
                _ = &mut deadline => return true,
                _ = ticker.tick() => {
                    if token.is_cancelled() {
                        return false;
                    }

                    self.publish_frame(state, token).await;
                },
            }
        }
    }

    async fn publish_frame(&self, state: &AnimationState, token: &CancellationToken) {
        let (color, transition) = state.frame(Instant::now(), self.config.timestep);
        self.publish(&color, transition, token).await;
    }

    /// Publish one color command
    ///
    /// A publisher that does not return is abandoned as soon as `token` is
    /// cancelled.
    async fn publish(&self, color: &Color, transition: Duration, token: &CancellationToken) {
        let payload = ColorPayload::new(color, transition.as_secs_f64(), self.format);

        let bytes = match payload.to_bytes() {
            Ok(bytes) => bytes,
            Err(error) => {
                error!(error = %error, "failed to encode payload");
                return;
            }
        };

        select! {
            biased;
            _ = token.cancelled() => {
                debug!(channel = %self.channel, "publish abandoned");
            }
            result = self.publisher.publish(&self.channel, bytes) => {
                if let Err(error) = result {
                    warn!(channel = %self.channel, error = %error, "publish failed");
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

/// Handle to a running [`Animator`]
///
/// Dropping the handle cancels the animation.
pub struct AnimatorHandle {
    device: String,
    token: CancellationToken,
    join_handle: Option<JoinHandle<()>>,
}

impl AnimatorHandle {
    /// Spawn `animator` on the current runtime
    ///
    /// A panic inside the animator is caught and logged, it never reaches the
    /// caller or other animators.
    pub fn spawn(animator: Animator) -> Self {
        let device = animator.device.clone();
        let token = CancellationToken::new();
        let span = info_span!("animator", device = %device);

        let join_handle = tokio::spawn(
            {
                let token = token.clone();

                async move {
                    if let Err(panic) = AssertUnwindSafe(animator.run(token)).catch_unwind().await
                    {
                        error!(
                            panic = %panic_message(panic.as_ref()),
                            span_trace = %SpanTrace::capture(),
                            "animator panicked"
                        );
                    }
                }
            }
            .instrument(span),
        );

        Self {
            device,
            token,
            join_handle: Some(join_handle),
        }
    }

    /// Friendly name of the animated device
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Request cancellation without waiting for the task
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `true` once the animator task returned, either cancelled or after a
    /// fault
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map_or(true, |join_handle| join_handle.is_finished())
    }

    /// Cancel the animator and wait for its task to complete
    pub async fn stop(mut self) {
        self.cancel();

        if let Some(join_handle) = self.join_handle.take() {
            if let Err(error) = join_handle.await {
                warn!(device = %self.device, error = %error, "failed to join animator");
            }
        }
    }
}

impl Drop for AnimatorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use async_trait::async_trait;

    use super::*;
    use crate::{
        api::PayloadColor,
        methods::{recording::Recording, PublishError},
        pool::ColorPool,
        runtime::DurationRange,
    };

    const FROM: Color = Color {
        l: 0.3,
        c: 0.1,
        h: 30.0,
    };
    const TO: Color = Color {
        l: 0.8,
        c: 0.2,
        h: 200.0,
    };

    fn config() -> RuntimeConfig {
        let mut config = RuntimeConfig::new(ColorPool::new(vec![FROM, TO]).unwrap());
        config.transition = DurationRange::fixed(Duration::from_secs(3));
        config.hold = DurationRange::fixed(Duration::from_secs(10));
        config.timestep = Duration::from_secs(1);
        config
    }

    fn spawn(publisher: Arc<dyn Publisher>) -> AnimatorHandle {
        AnimatorHandle::spawn(
            Animator::new(
                "desk".to_owned(),
                "zigbee2mqtt/desk/set".to_owned(),
                config(),
                PayloadFormat::Xy,
                publisher,
            )
            .with_rng(StdRng::seed_from_u64(1)),
        )
    }

    fn xy(payload: &ColorPayload) -> (f64, f64) {
        match payload.color {
            PayloadColor::Xy { x, y } => (x, y),
            other => panic!("unexpected payload color {:?}", other),
        }
    }

    #[test]
    fn frame_reaches_ahead_one_timestep() {
        let start = Instant::now();
        let state = AnimationState::new(FROM, TO, start, Duration::from_secs(10));
        let timestep = Duration::from_secs(1);

        let (color, transition) = state.frame(start + Duration::from_secs(4), timestep);
        assert_eq!(transition, timestep);
        assert_abs_diff_eq!(color.l, FROM.lerp(&TO, 0.5).l, epsilon = 1e-9);

        // Less than a timestep left
        let (color, transition) = state.frame(start + Duration::from_millis(9500), timestep);
        assert_eq!(transition, Duration::from_millis(500));
        assert_eq!(color, TO);

        let (color, transition) = state.frame(start + Duration::from_secs(12), timestep);
        assert_eq!(transition, Duration::ZERO);
        assert_eq!(color, TO);
    }

    #[test]
    fn empty_transition_jumps_to_target() {
        let start = Instant::now();
        let state = AnimationState::new(FROM, TO, start, Duration::ZERO);

        assert_eq!(
            state.frame(start, Duration::from_secs(1)),
            (TO, Duration::ZERO)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn frames_precede_final_color() {
        let recording = Arc::new(Recording::new());
        let handle = spawn(recording.clone());

        sleep(Duration::from_millis(3500)).await;

        let published = recording.published();
        assert_eq!(published.len(), 4, "{:?}", published);
        assert!(published
            .iter()
            .all(|published| published.channel == "zigbee2mqtt/desk/set"));
        assert!(published.windows(2).all(|pair| pair[0].at <= pair[1].at));

        let transitions: Vec<_> = published.iter().map(|p| p.payload.transition).collect();
        assert_eq!(transitions, vec![Some(1.0), Some(1.0), Some(1.0), None]);

        // The first pick of a two-color pool is always the first color, the
        // second one can't repeat it
        let (x, y) = xy(&published[3].payload);
        let (ex, ey) = TO.to_xy();
        assert_abs_diff_eq!(x, ex, epsilon = 1e-9);
        assert_abs_diff_eq!(y, ey, epsilon = 1e-9);

        // Frames move towards the target
        let (x0, _) = xy(&published[0].payload);
        let (x1, _) = xy(&published[1].payload);
        assert_abs_diff_eq!(x0, FROM.lerp(&TO, 1.0 / 3.0).to_xy().0, epsilon = 1e-9);
        assert_abs_diff_eq!(x1, FROM.lerp(&TO, 2.0 / 3.0).to_xy().0, epsilon = 1e-9);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn hold_then_next_cycle() {
        let recording = Arc::new(Recording::new());
        let handle = spawn(recording.clone());

        // Nothing is published while holding
        sleep(Duration::from_secs(12)).await;
        assert_eq!(recording.count(), 4);

        // The second cycle starts after the 10s hold
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(recording.count(), 5);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_publish_after_cancel() {
        let recording = Arc::new(Recording::new());
        let handle = spawn(recording.clone());

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(recording.count(), 2);

        handle.cancel();
        sleep(Duration::from_secs(60)).await;
        assert_eq!(recording.count(), 2);
        assert!(handle.is_finished());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let recording = Arc::new(Recording::new());
        drop(spawn(recording.clone()));

        sleep(Duration::from_secs(60)).await;
        assert_eq!(recording.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_errors_are_not_fatal() {
        let recording = Arc::new(Recording::new());
        recording.set_failing(true);
        let handle = spawn(recording.clone());

        sleep(Duration::from_millis(14500)).await;
        assert_eq!(recording.count(), 6);
        assert!(!handle.is_finished());

        handle.stop().await;
    }

    struct Panicking;

    #[async_trait]
    impl Publisher for Panicking {
        async fn publish(&self, _channel: &str, _payload: Vec<u8>) -> Result<(), PublishError> {
            panic!("transport exploded");
        }
    }

    /// Publisher that never completes
    struct Stuck;

    #[async_trait]
    impl Publisher for Stuck {
        async fn publish(&self, _channel: &str, _payload: Vec<u8>) -> Result<(), PublishError> {
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_publisher_does_not_block_stop() {
        let handle = spawn(Arc::new(Stuck));

        sleep(Duration::from_secs(5)).await;
        assert!(!handle.is_finished());

        tokio::time::timeout(Duration::from_secs(1), handle.stop())
            .await
            .expect("stop did not complete");
    }

    #[tokio::test(start_paused = true)]
    async fn panics_are_contained() {
        let handle = spawn(Arc::new(Panicking));

        sleep(Duration::from_secs(1)).await;
        assert!(handle.is_finished());

        // Joining does not propagate the panic
        handle.stop().await;
    }
}
