/// Listener invoked with (old, new) whenever the selection changes
pub type ChangeListener = Box<dyn FnMut(i32, i32)>;

/// Bounded integer selection control with change listeners
pub struct Slider {
    pub title: String,
    start: i32,
    end: i32,
    step: i32,
    value: i32,
    listeners: Vec<ChangeListener>,
}

impl Slider {
    /// `value` is clamped into `start..=end`; `step` below 1 is treated as 1
    pub fn new(title: impl Into<String>, start: i32, end: i32, step: i32, value: i32) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let mut slider = Self {
            title: title.into(),
            start,
            end,
            step: step.max(1),
            value: start,
            listeners: Vec::new(),
        };
        slider.value = slider.snap(value);
        slider
    }

    /// Register a listener for value changes
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(i32, i32) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Clamp into bounds and onto the step grid
    fn snap(&self, value: i32) -> i32 {
        let clamped = value.clamp(self.start, self.end);
        let steps = (clamped - self.start) / self.step;
        self.start + steps * self.step
    }

    /// Set the value, notifying listeners only if it actually changed.
    /// Returns the value after snapping.
    pub fn set_value(&mut self, value: i32) -> i32 {
        let new = self.snap(value);
        let old = self.value;
        if new != old {
            self.value = new;
            for listener in &mut self.listeners {
                listener(old, new);
            }
        }
        self.value
    }

    /// Move by `n` steps (negative moves back)
    pub fn step_by(&mut self, n: i32) -> i32 {
        let target = self.value.saturating_add(n.saturating_mul(self.step));
        self.set_value(target)
    }

    /// Set the value from a position along a track of `width` cells
    pub fn set_from_track(&mut self, offset: u16, width: u16) -> i32 {
        if width <= 1 {
            return self.set_value(self.start);
        }
        let frac = offset.min(width - 1) as f64 / (width - 1) as f64;
        let span = (self.end - self.start) as f64;
        self.set_value(self.start + (frac * span).round() as i32)
    }

    /// Position of the current value as a fraction of the range
    pub fn ratio(&self) -> f64 {
        if self.end == self.start {
            return 0.0;
        }
        (self.value - self.start) as f64 / (self.end - self.start) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_clamped_to_bounds() {
        let mut slider = Slider::new("Year", 1900, 2013, 1, 1850);
        assert_eq!(slider.value(), 1900);
        assert_eq!(slider.set_value(3000), 2013);
        assert_eq!(slider.step_by(-200), 1900);
    }

    #[test]
    fn test_listeners_receive_old_and_new() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut slider = Slider::new("Year", 1900, 2013, 1, 2000);

        let log = Rc::clone(&seen);
        slider.on_change(move |old, new| log.borrow_mut().push((old, new)));

        slider.set_value(2001);
        slider.set_value(2001); // unchanged, no event
        slider.step_by(-10);

        assert_eq!(*seen.borrow(), vec![(2000, 2001), (2001, 1991)]);
    }

    #[test]
    fn test_step_grid() {
        let mut slider = Slider::new("Decade", 1900, 2010, 10, 1957);
        assert_eq!(slider.value(), 1950);
        assert_eq!(slider.step_by(1), 1960);
        assert_eq!(slider.set_value(2013), 2010);
    }

    #[test]
    fn test_track_position() {
        let mut slider = Slider::new("Year", 1900, 2000, 1, 1900);
        assert_eq!(slider.set_from_track(50, 101), 1950);
        assert_eq!(slider.set_from_track(500, 101), 2000);
        assert!((slider.ratio() - 1.0).abs() < 1e-9);
    }
}
