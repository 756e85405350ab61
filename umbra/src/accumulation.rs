use glam::Mat4;

/// Total number of samples a static camera accumulates before estimation
/// stops.
const MAX_ACCUMULATED_SAMPLES: u32 = 1024;

/// What a frame should do about temporal accumulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccumulationStep {
    /// Number of frames accumulated so far (zero after a reset)
    pub frame: u32,

    /// Whether the accumulation buffer has to be cleared first
    pub clear: bool,

    /// Whether occlusion has to be estimated at all; once enough samples have
    /// been gathered, the accumulation buffer is reused as it is
    pub estimate: bool,

    /// Weight the freshly estimated occlusion is blended with
    pub weight: f32,
}

/// Decides whether occlusion of consecutive frames can be averaged together,
/// which is the case as long as the camera stays still.
#[derive(Debug, Default)]
pub struct AccumulationController {
    frame: u32,
    last_view: Option<Mat4>,
    last_projection: Option<Mat4>,
    needs_reset: bool,
}

impl AccumulationController {
    pub fn begin_frame(
        &mut self,
        view: Mat4,
        projection: Mat4,
        accumulate: bool,
        ao_samples: u32,
    ) -> AccumulationStep {
        let ao_samples = ao_samples.max(1);

        // Matrices are compared exactly; any movement, however tiny,
        // restarts accumulation
        let is_still = self.last_view == Some(view)
            && self.last_projection == Some(projection);

        let continues = accumulate && is_still && !self.needs_reset;

        if continues {
            let max_frame = MAX_ACCUMULATED_SAMPLES.div_ceil(ao_samples);

            self.frame = (self.frame + 1).min(max_frame);
        } else {
            self.frame = 0;
        }

        self.last_view = Some(view);
        self.last_projection = Some(projection);
        self.needs_reset = false;

        let estimate = (self.frame as f32)
            < (MAX_ACCUMULATED_SAMPLES as f32) / (ao_samples as f32);

        AccumulationStep {
            frame: self.frame,
            clear: !continues && accumulate,
            estimate,
            weight: 1.0 / (self.frame as f32 + 1.0),
        }
    }

    /// Makes the next frame start accumulating from scratch.
    pub fn invalidate(&mut self) {
        self.needs_reset = true;
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec3, Vec3};

    use super::*;

    fn matrices() -> (Mat4, Mat4) {
        let view = Mat4::look_at_rh(vec3(0.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);

        (view, projection)
    }

    #[test]
    fn accumulates_while_still() {
        let (view, projection) = matrices();
        let mut target = AccumulationController::default();

        let step = target.begin_frame(view, projection, true, 16);

        assert_eq!(0, step.frame);
        assert!(step.clear);
        assert!(step.estimate);
        assert_eq!(1.0, step.weight);

        for frame in 1..10 {
            let step = target.begin_frame(view, projection, true, 16);

            assert_eq!(frame, step.frame);
            assert!(!step.clear);
            assert_eq!(1.0 / (frame as f32 + 1.0), step.weight);
        }
    }

    #[test]
    fn resets_on_movement() {
        let (view, projection) = matrices();
        let mut target = AccumulationController::default();

        for _ in 0..5 {
            target.begin_frame(view, projection, true, 16);
        }

        let moved = view * Mat4::from_translation(vec3(0.0, 0.0, 1e-4));
        let step = target.begin_frame(moved, projection, true, 16);

        assert_eq!(0, step.frame);
        assert!(step.clear);

        let step = target.begin_frame(moved, projection * 1.0001, true, 16);

        assert_eq!(0, step.frame);
    }

    #[test]
    fn resets_on_invalidation() {
        let (view, projection) = matrices();
        let mut target = AccumulationController::default();

        target.begin_frame(view, projection, true, 16);
        target.begin_frame(view, projection, true, 16);
        target.invalidate();

        let step = target.begin_frame(view, projection, true, 16);

        assert_eq!(0, step.frame);
        assert!(step.clear);

        let step = target.begin_frame(view, projection, true, 16);

        assert_eq!(1, step.frame);
    }

    #[test]
    fn disabled() {
        let (view, projection) = matrices();
        let mut target = AccumulationController::default();

        for _ in 0..5 {
            let step = target.begin_frame(view, projection, false, 16);

            assert_eq!(0, step.frame);
            assert!(!step.clear);
            assert!(step.estimate);
            assert_eq!(1.0, step.weight);
        }
    }

    #[test]
    fn saturates() {
        let (view, projection) = matrices();

        for ao_samples in [1, 3, 16, 64] {
            let mut target = AccumulationController::default();
            let max_frame = 1024u32.div_ceil(ao_samples);
            let mut estimated = 0;

            for _ in 0..2000 {
                let step = target.begin_frame(view, projection, true, ao_samples);

                assert!(step.frame <= max_frame);

                if step.estimate {
                    estimated += 1;
                }
            }

            assert_eq!(max_frame, target.frame);

            // Frames 0..(1024 / ao_samples) estimate, the rest doesn't
            assert_eq!(
                (1024.0 / ao_samples as f32).ceil() as u32,
                estimated,
                "ao_samples={ao_samples}",
            );
        }
    }
}
