mod bootstrap;
mod loop_runner;
mod sprites;
mod world;

pub(crate) use loop_runner::run;
