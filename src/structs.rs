pub mod appstate;
pub mod dependency;
pub mod event;
pub mod tab;
pub mod timedstring;
