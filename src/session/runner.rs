use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use super::controller::Controller;
use super::state::{Effect, Event, Generation};
use super::view::ViewState;
use crate::client::{ConversionService, Navigator};

/// Drives a [`Controller`] against a real (or mocked) service.
///
/// Requests run one at a time on the caller's thread, so the controller
/// never sees two in flight.
pub struct SessionRunner<S, N> {
    controller: Controller,
    service: S,
    navigator: N,
    pending_reset: Option<(Generation, Duration)>,
    observer: Option<Box<dyn FnMut(&ViewState)>>,
}

impl<S: ConversionService, N: Navigator> SessionRunner<S, N> {
    pub fn new(controller: Controller, service: S, navigator: N) -> Self {
        Self {
            controller,
            service,
            navigator,
            pending_reset: None,
            observer: None,
        }
    }

    /// Called with the in-flight view just before each service request
    pub fn with_observer(mut self, observer: impl FnMut(&ViewState) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn view(&self) -> &ViewState {
        self.controller.view()
    }

    #[cfg(test)]
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn has_pending_reset(&self) -> bool {
        self.pending_reset.is_some()
    }

    /// Feed an event in and keep going until no effects are left
    pub fn dispatch(&mut self, event: Event) -> Result<()> {
        let mut queue = VecDeque::from([event]);
        let mut navigation_error = None;

        while let Some(event) = queue.pop_front() {
            for effect in self.controller.handle(event) {
                match effect {
                    Effect::Analyze { generation, url } => {
                        self.notify();
                        let outcome = self.service.analyze(&url);
                        queue.push_back(Event::AnalysisFinished {
                            generation,
                            outcome,
                        });
                    }
                    Effect::Download { generation, songs } => {
                        self.notify();
                        let outcome = self.service.download(&songs);
                        queue.push_back(Event::DownloadFinished {
                            generation,
                            outcome,
                        });
                    }
                    Effect::Navigate { path } => {
                        if let Err(e) = self.navigator.navigate(&path) {
                            warn!("navigation to {path} failed: {e:#}");
                            navigation_error = Some(e.context(format!("Failed to retrieve {path}")));
                        }
                    }
                    Effect::ScheduleReset { generation, after } => {
                        debug!("reset for {generation} scheduled in {after:?}");
                        self.pending_reset = Some((generation, after));
                    }
                }
            }
        }

        match navigation_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(self.controller.view());
        }
    }

    /// Wait out a scheduled reset, if any, then apply it
    pub fn settle(&mut self) -> Result<()> {
        if let Some((generation, after)) = self.pending_reset.take() {
            thread::sleep(after);
            self.dispatch(Event::ResetElapsed { generation })?;
        }
        Ok(())
    }

    pub fn submit(&mut self, url: &str) -> Result<()> {
        self.dispatch(Event::Submit(url.to_string()))
    }

    pub fn confirm(&mut self) -> Result<()> {
        self.dispatch(Event::Confirm)
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.pending_reset = None;
        self.dispatch(Event::Cancel)
    }
}
