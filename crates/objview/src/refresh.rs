//! The cooperative pump around a [RenderController]: UI events arrive as
//! messages on a channel, a ticker keeps the remote view fresh, and a
//! shutdown signal stops the whole thing at a cycle boundary.
//!
//! Everything runs on one task; redraws are serialized by construction, never
//! by locking.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::{controller::RenderController, error::ViewerError, params::ParamValue};

/// Tolerated in a row before the periodic loop gives up.
const MAX_CONSECUTIVE_REFRESH_FAILURES: u32 = 3;

/// A discrete UI event delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    SetParameter { name: String, value: ParamValue },
    ResetView,
}

/// Requests a stop; observed by the loop at its next cycle boundary.
pub struct ShutdownHandle(watch::Sender<bool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.0.send(true);
    }
}

/// The receiving side of a shutdown request.
#[derive(Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Completes once shutdown is requested. Dropping the handle counts.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

pub fn shutdown_channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle(tx), Shutdown(rx))
}

pub struct EventLoop {
    controller: RenderController,
    events: mpsc::Receiver<ControlEvent>,
    period: Duration,
    shutdown: Shutdown,
}

impl EventLoop {
    pub fn new(
        controller: RenderController,
        events: mpsc::Receiver<ControlEvent>,
        period: Duration,
        shutdown: Shutdown,
    ) -> Result<Self, ViewerError> {
        if period.is_zero() {
            return Err(ViewerError::InvalidParameter {
                name: "refresh period".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }

        Ok(Self {
            controller,
            events,
            period,
            shutdown,
        })
    }

    /// Runs until shutdown is requested or every event sender is gone, then
    /// hands the controller back.
    ///
    /// The first frame is the caller's business; ticks only keep it fresh.
    /// Events are dispatched in the order they were enqueued, one redraw and
    /// one notification per event or tick, nothing coalesced. A rejected
    /// parameter value is logged and absorbed; periodic redraw failures are
    /// tolerated up to [MAX_CONSECUTIVE_REFRESH_FAILURES] in a row.
    pub async fn run(self) -> Result<RenderController, ViewerError> {
        let EventLoop {
            mut controller,
            mut events,
            period,
            mut shutdown,
        } = self;

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // an interval fires immediately; the caller already drew that frame
        ticker.tick().await;

        let mut failures = 0u32;
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                event = events.recv() => match event {
                    Some(event) => dispatch(&mut controller, event)?,
                    // every sender is gone, nothing can reach the scene anymore
                    None => break,
                },

                _ = ticker.tick() => match controller.refresh() {
                    Ok(()) => failures = 0,
                    Err(err) => {
                        failures += 1;
                        log::warn!("periodic refresh failed ({failures}): {err}");
                        if failures >= MAX_CONSECUTIVE_REFRESH_FAILURES {
                            return Err(ViewerError::RefreshLoopFailed {
                                consecutive: failures,
                                source: Box::new(err),
                            });
                        }
                    }
                },
            }
        }

        log::info!("event loop stopped");
        Ok(controller)
    }
}

fn dispatch(controller: &mut RenderController, event: ControlEvent) -> Result<(), ViewerError> {
    let result = match event {
        ControlEvent::SetParameter { ref name, value } => controller.set_parameter(name, value),
        ControlEvent::ResetView => controller.reset_view(),
    };

    match result {
        // a rejected value keeps the previous state; the session goes on
        Err(err @ ViewerError::InvalidParameter { .. }) => {
            log::warn!("{err}");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use crate::{
        backend,
        scene::{Scene, TriangleMesh},
        target::RenderTarget,
        view::ViewSink,
        Dimensions,
    };

    use super::*;

    const DIM: Dimensions = Dimensions {
        width: 8,
        height: 8,
    };
    const PERIOD: Duration = Duration::from_millis(100);

    struct CountingSink(Rc<RefCell<u32>>);

    impl ViewSink for CountingSink {
        fn frame_ready(&mut self, _frame: &crate::FrameBuffer) -> anyhow::Result<()> {
            *self.0.borrow_mut() += 1;
            Ok(())
        }
    }

    struct FailingSink;

    impl ViewSink for FailingSink {
        fn frame_ready(&mut self, _frame: &crate::FrameBuffer) -> anyhow::Result<()> {
            anyhow::bail!("sink is broken")
        }
    }

    fn controller(sink: Box<dyn ViewSink>) -> RenderController {
        let mut scene = Scene::default();
        scene.add_mesh(TriangleMesh::new(
            "tri".into(),
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
            Vec3::splat(0.7),
        ));
        let target = RenderTarget::new(scene, DIM, backend::resolve("softray").unwrap());
        RenderController::new(target, sink)
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn zero_period_is_rejected() {
        let (_tx, rx) = mpsc::channel(4);
        let (_handle, shutdown) = shutdown_channel();
        let err = EventLoop::new(
            controller(Box::new(CountingSink(Rc::default()))),
            rx,
            Duration::ZERO,
            shutdown,
        )
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(err, ViewerError::InvalidParameter { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn events_and_ticks_each_notify_once_in_order() {
        let frames = Rc::new(RefCell::new(0));
        let (tx, rx) = mpsc::channel(16);
        let (handle, shutdown) = shutdown_channel();
        let event_loop = EventLoop::new(
            controller(Box::new(CountingSink(Rc::clone(&frames)))),
            rx,
            PERIOD,
            shutdown,
        )
        .unwrap();

        let driver = async {
            tx.send(ControlEvent::SetParameter {
                name: "ambient".into(),
                value: ParamValue::Number(2.0),
            })
            .await
            .unwrap();
            settle().await;
            assert_eq!(*frames.borrow(), 1);

            tokio::time::advance(PERIOD).await;
            settle().await;
            assert_eq!(*frames.borrow(), 2);

            tx.send(ControlEvent::SetParameter {
                name: "refinement".into(),
                value: ParamValue::Number(8.0),
            })
            .await
            .unwrap();
            settle().await;
            assert_eq!(*frames.borrow(), 3);

            handle.shutdown();
        };

        let (result, ()) = tokio::join!(event_loop.run(), driver);
        let controller = result.unwrap();

        assert_eq!(*frames.borrow(), 3);
        assert_eq!(
            controller.parameter("ambient"),
            Some(ParamValue::Number(2.0))
        );
        assert_eq!(
            controller.parameter("refinement"),
            Some(ParamValue::Number(8.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_events_are_absorbed_without_a_redraw() {
        let frames = Rc::new(RefCell::new(0));
        let (tx, rx) = mpsc::channel(16);
        let (handle, shutdown) = shutdown_channel();
        let event_loop = EventLoop::new(
            controller(Box::new(CountingSink(Rc::clone(&frames)))),
            rx,
            PERIOD,
            shutdown,
        )
        .unwrap();

        let driver = async {
            tx.send(ControlEvent::SetParameter {
                name: "refinement".into(),
                value: ParamValue::Number(33.0),
            })
            .await
            .unwrap();
            settle().await;
            handle.shutdown();
        };

        let (result, ()) = tokio::join!(event_loop.run(), driver);
        let controller = result.unwrap();

        assert_eq!(*frames.borrow(), 0);
        assert_eq!(
            controller.parameter("refinement"),
            Some(ParamValue::Number(4.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_notifications_after_shutdown() {
        let frames = Rc::new(RefCell::new(0));
        let (_tx, rx) = mpsc::channel::<ControlEvent>(16);
        let (handle, shutdown) = shutdown_channel();
        let event_loop = EventLoop::new(
            controller(Box::new(CountingSink(Rc::clone(&frames)))),
            rx,
            PERIOD,
            shutdown,
        )
        .unwrap();

        let driver = async {
            tokio::time::advance(PERIOD).await;
            settle().await;
            assert_eq!(*frames.borrow(), 1);

            handle.shutdown();
            settle().await;

            // ticks that would be due after the stop change nothing
            tokio::time::advance(3 * PERIOD).await;
            settle().await;
        };

        let (result, ()) = tokio::join!(event_loop.run(), driver);
        result.unwrap();

        assert_eq!(*frames.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_event_channel_stops_the_loop() {
        let (tx, rx) = mpsc::channel::<ControlEvent>(4);
        let (_handle, shutdown) = shutdown_channel();
        let event_loop = EventLoop::new(
            controller(Box::new(CountingSink(Rc::default()))),
            rx,
            PERIOD,
            shutdown,
        )
        .unwrap();

        drop(tx);
        let controller = event_loop.run().await.unwrap();
        assert_eq!(
            controller.parameter("denoise"),
            Some(ParamValue::Bool(true))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_refresh_failures_stop_the_loop() {
        let (_tx, rx) = mpsc::channel::<ControlEvent>(4);
        let (_handle, shutdown) = shutdown_channel();
        let event_loop =
            EventLoop::new(controller(Box::new(FailingSink)), rx, PERIOD, shutdown).unwrap();

        let driver = async {
            for _ in 0..MAX_CONSECUTIVE_REFRESH_FAILURES {
                tokio::time::advance(PERIOD).await;
                settle().await;
            }
        };

        let (result, ()) = tokio::join!(event_loop.run(), driver);
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ViewerError::RefreshLoopFailed { consecutive, .. }
                if consecutive == MAX_CONSECUTIVE_REFRESH_FAILURES
        ));
    }
}
