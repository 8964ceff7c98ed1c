//! Options for copying objects between hierarchies.

/// The samples copied for variables with an unlimited dimension.
///
/// Variables without an unlimited dimension always copy every sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleRange {
    /// The first source sample.
    pub src_start: usize,
    /// The first destination sample.
    pub dest_start: usize,
    /// The number of samples, or [`None`] for every source sample from `src_start`.
    pub count: Option<usize>,
}

impl SampleRange {
    /// Create a sample range.
    #[must_use]
    pub const fn new(src_start: usize, dest_start: usize, count: Option<usize>) -> Self {
        Self {
            src_start,
            dest_start,
            count,
        }
    }
}

/// Copy options.
///
/// By default, objects missing from the destination are created and existing objects are only filled if they are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CopyOptions {
    skip_dims: bool,
    skip_group_atts: bool,
    skip_var_atts: bool,
    skip_vars: bool,
    skip_data: bool,
    skip_subgroups: bool,
    copy_locks: bool,
    exclusive: bool,
    overwrite_dims: bool,
    overwrite_atts: bool,
    overwrite_data: bool,
    samples: SampleRange,
}

impl CopyOptions {
    /// Create a new copy options builder.
    #[must_use]
    pub fn builder() -> CopyOptionsBuilder {
        CopyOptionsBuilder::new()
    }

    /// Returns true if dimensions are not copied.
    #[must_use]
    pub const fn skip_dims(&self) -> bool {
        self.skip_dims
    }

    /// Returns true if group attributes are not copied.
    #[must_use]
    pub const fn skip_group_atts(&self) -> bool {
        self.skip_group_atts
    }

    /// Returns true if variable attributes are not copied.
    #[must_use]
    pub const fn skip_var_atts(&self) -> bool {
        self.skip_var_atts
    }

    /// Returns true if variables are not copied.
    #[must_use]
    pub const fn skip_vars(&self) -> bool {
        self.skip_vars
    }

    /// Returns true if variable data is not copied.
    #[must_use]
    pub const fn skip_data(&self) -> bool {
        self.skip_data
    }

    /// Returns true if subgroups are not traversed.
    #[must_use]
    pub const fn skip_subgroups(&self) -> bool {
        self.skip_subgroups
    }

    /// Returns true if definition locks are copied.
    #[must_use]
    pub const fn copy_locks(&self) -> bool {
        self.copy_locks
    }

    /// Returns true if only objects already defined in the destination are copied.
    #[must_use]
    pub const fn exclusive(&self) -> bool {
        self.exclusive
    }

    /// Returns true if the lengths of existing unlocked dimensions are overwritten.
    #[must_use]
    pub const fn overwrite_dims(&self) -> bool {
        self.overwrite_dims
    }

    /// Returns true if the values of existing unlocked attributes are overwritten.
    #[must_use]
    pub const fn overwrite_atts(&self) -> bool {
        self.overwrite_atts
    }

    /// Returns true if existing variable data is overwritten.
    #[must_use]
    pub const fn overwrite_data(&self) -> bool {
        self.overwrite_data
    }

    /// Returns the samples copied for variables with an unlimited dimension.
    #[must_use]
    pub const fn samples(&self) -> SampleRange {
        self.samples
    }
}

/// Builder for [`CopyOptions`].
#[derive(Clone, Debug, Default)]
pub struct CopyOptionsBuilder {
    options: CopyOptions,
}

impl CopyOptionsBuilder {
    /// Create a new copy options builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build into copy options.
    #[must_use]
    pub fn build(&self) -> CopyOptions {
        self.options.clone()
    }

    /// Do not copy dimensions.
    #[must_use]
    pub fn skip_dims(mut self) -> Self {
        self.options.skip_dims = true;
        self
    }

    /// Do not copy group attributes.
    #[must_use]
    pub fn skip_group_atts(mut self) -> Self {
        self.options.skip_group_atts = true;
        self
    }

    /// Do not copy variable attributes.
    #[must_use]
    pub fn skip_var_atts(mut self) -> Self {
        self.options.skip_var_atts = true;
        self
    }

    /// Do not copy variables.
    #[must_use]
    pub fn skip_vars(mut self) -> Self {
        self.options.skip_vars = true;
        self
    }

    /// Do not copy variable data.
    #[must_use]
    pub fn skip_data(mut self) -> Self {
        self.options.skip_data = true;
        self
    }

    /// Do not traverse subgroups.
    #[must_use]
    pub fn skip_subgroups(mut self) -> Self {
        self.options.skip_subgroups = true;
        self
    }

    /// Copy definition lock values.
    #[must_use]
    pub fn copy_locks(mut self) -> Self {
        self.options.copy_locks = true;
        self
    }

    /// Only copy into objects already defined in the destination.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.options.exclusive = true;
        self
    }

    /// Overwrite the lengths of existing dimensions unless they are locked.
    #[must_use]
    pub fn overwrite_dims(mut self) -> Self {
        self.options.overwrite_dims = true;
        self
    }

    /// Overwrite the values of existing attributes unless they are locked.
    ///
    /// A `units` attribute is never overwritten when variable data is converted.
    #[must_use]
    pub fn overwrite_atts(mut self) -> Self {
        self.options.overwrite_atts = true;
        self
    }

    /// Overwrite existing variable data.
    #[must_use]
    pub fn overwrite_data(mut self) -> Self {
        self.options.overwrite_data = true;
        self
    }

    /// Set the samples copied for variables with an unlimited dimension.
    #[must_use]
    pub fn samples(mut self, samples: SampleRange) -> Self {
        self.options.samples = samples;
        self
    }
}
