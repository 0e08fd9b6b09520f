use crate::config::LineageConfig;

/// Something that can run an experiment from a resolved configuration.
pub trait Runnable {
    fn run(&mut self, config: &LineageConfig) -> anyhow::Result<()>;
}

impl<F> Runnable for F
where
    F: FnMut(&LineageConfig) -> anyhow::Result<()>,
{
    fn run(&mut self, config: &LineageConfig) -> anyhow::Result<()> {
        self(config)
    }
}
