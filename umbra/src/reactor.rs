use std::fmt;

use crate::Configuration;

/// Single thing that has to be rebuilt after a configuration change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rebuild {
    /// Regenerate the estimator's hemisphere samples
    HemisphereSamples,

    /// Switch to another estimator pipeline
    EstimatorVariant,

    /// Regenerate the denoiser's Poisson-disk offsets
    PoissonSamples,

    /// Switch to another denoiser pipeline
    DenoiseVariant,

    /// Allocate (or release) the half-resolution depth & normal target
    DownsampleTarget,

    /// Switch to another composition pipeline
    CompositeVariant,

    /// Reallocate occlusion targets
    Resize,

    /// Allocate (or release) the transparency targets
    TransparencyTargets,

    /// Reallocate the beauty target
    BeautyTarget,

    /// Restart temporal accumulation
    FreshFrame,
}

impl Rebuild {
    /// All actions, in the order they are executed.
    pub const ALL: [Rebuild; 10] = [
        Rebuild::Resize,
        Rebuild::BeautyTarget,
        Rebuild::DownsampleTarget,
        Rebuild::TransparencyTargets,
        Rebuild::HemisphereSamples,
        Rebuild::PoissonSamples,
        Rebuild::EstimatorVariant,
        Rebuild::DenoiseVariant,
        Rebuild::CompositeVariant,
        Rebuild::FreshFrame,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of actions that have to happen before the next frame.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildPlan {
    actions: u16,
}

impl RebuildPlan {
    pub fn new(actions: impl IntoIterator<Item = Rebuild>) -> Self {
        let mut this = Self::default();

        for action in actions {
            this.insert(action);
        }

        this
    }

    pub fn insert(&mut self, action: Rebuild) {
        self.actions |= action.bit();
    }

    pub fn contains(&self, action: Rebuild) -> bool {
        self.actions & action.bit() != 0
    }

    pub fn merge(&mut self, other: RebuildPlan) {
        self.actions |= other.actions;
    }

    pub fn is_empty(&self) -> bool {
        self.actions == 0
    }

    pub fn len(&self) -> usize {
        self.actions.count_ones() as usize
    }

    /// Returns actions in their execution order.
    pub fn iter(&self) -> impl Iterator<Item = Rebuild> + '_ {
        Rebuild::ALL
            .into_iter()
            .filter(|action| self.contains(*action))
    }

    /// Whether any of the shared GPU resources (targets, samples, variants)
    /// has to be recreated.
    pub fn needs_rebuilding(&self) -> bool {
        self.iter().any(|action| action != Rebuild::FreshFrame)
    }
}

impl fmt::Debug for RebuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Keeps track of the current configuration and tells what needs to be
/// rebuilt when it changes.
#[derive(Debug, Default)]
pub struct ConfigurationReactor {
    config: Configuration,
}

impl ConfigurationReactor {
    pub fn new(config: Configuration) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Switches to given configuration, returning what has to be rebuilt
    /// because of it.
    pub fn apply(&mut self, next: Configuration) -> RebuildPlan {
        let next = next.sanitized();
        let prev = &self.config;
        let mut plan = RebuildPlan::default();

        if *prev == next {
            return plan;
        }

        plan.insert(Rebuild::FreshFrame);

        if prev.ao_samples != next.ao_samples {
            plan.insert(Rebuild::HemisphereSamples);
            plan.insert(Rebuild::EstimatorVariant);
        }

        if prev.denoise_samples != next.denoise_samples {
            plan.insert(Rebuild::PoissonSamples);
            plan.insert(Rebuild::DenoiseVariant);
        }

        if prev.half_res != next.half_res {
            plan.insert(Rebuild::EstimatorVariant);
            plan.insert(Rebuild::DownsampleTarget);
            plan.insert(Rebuild::CompositeVariant);
            plan.insert(Rebuild::Resize);
        }

        if prev.depth_aware_upsampling != next.depth_aware_upsampling {
            plan.insert(Rebuild::CompositeVariant);
        }

        if prev.transparency_aware != next.transparency_aware {
            plan.insert(Rebuild::TransparencyTargets);
        }

        if prev.stencil != next.stencil {
            plan.insert(Rebuild::BeautyTarget);
        }

        if prev.depth_convention != next.depth_convention {
            plan.insert(Rebuild::EstimatorVariant);
            plan.insert(Rebuild::DenoiseVariant);
            plan.insert(Rebuild::CompositeVariant);
        }

        self.config = next;

        plan
    }
}
