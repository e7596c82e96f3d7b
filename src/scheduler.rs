use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;

pub const FRAME_BUDGET_MS: f64 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RedrawDecision {
    /// Render right away; any pending deferred render must be dropped.
    Immediate,
    /// Render once after `delay_ms`, replacing any pending deferred render.
    Deferred { delay_ms: f64 },
}

/// Leading-edge render with a trailing deferred render. Elapsed time is
/// re-evaluated on every request, so a continuous stream of requests still
/// renders once per budget instead of being pushed back forever.
#[derive(Clone, Debug)]
pub struct RedrawScheduler {
    budget_ms: f64,
    last_render: Option<f64>,
    pending: bool,
    renders: u64,
}

impl Default for RedrawScheduler {
    fn default() -> Self {
        Self::new(FRAME_BUDGET_MS)
    }
}

impl RedrawScheduler {
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            last_render: None,
            pending: false,
            renders: 0,
        }
    }

    pub fn request(&mut self, now: f64) -> RedrawDecision {
        let elapsed = self.last_render.map_or(f64::INFINITY, |last| now - last);
        if elapsed >= self.budget_ms {
            self.record_render(now);
            RedrawDecision::Immediate
        } else {
            self.pending = true;
            RedrawDecision::Deferred {
                delay_ms: self.budget_ms - elapsed,
            }
        }
    }

    pub fn deferred_fired(&mut self, now: f64) {
        self.record_render(now);
    }

    fn record_render(&mut self, now: f64) {
        self.last_render = Some(now);
        self.pending = false;
        self.renders += 1;
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }
}

/// Browser-side driver: owns the single outstanding `Timeout`. Replacing or
/// dropping the handle cancels the previous deferred render.
pub struct RedrawLoop {
    scheduler: RedrawScheduler,
    pending: Option<Timeout>,
    render: Rc<dyn Fn()>,
}

impl RedrawLoop {
    pub fn new(budget_ms: f64, render: Rc<dyn Fn()>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            scheduler: RedrawScheduler::new(budget_ms),
            pending: None,
            render,
        }))
    }

    pub fn request(this: &Rc<RefCell<Self>>) {
        let now = js_sys::Date::now();
        let render = {
            let mut inner = this.borrow_mut();
            match inner.scheduler.request(now) {
                RedrawDecision::Immediate => {
                    inner.pending = None;
                    Some(inner.render.clone())
                }
                RedrawDecision::Deferred { delay_ms } => {
                    let weak: Weak<RefCell<Self>> = Rc::downgrade(this);
                    inner.pending = Some(Timeout::new(delay_ms.ceil() as u32, move || {
                        let Some(this) = weak.upgrade() else {
                            return;
                        };
                        let render = {
                            let mut inner = this.borrow_mut();
                            inner.scheduler.deferred_fired(js_sys::Date::now());
                            inner.render.clone()
                        };
                        render();
                    }));
                    None
                }
            }
        };
        if let Some(render) = render {
            render();
        }
    }
}
