//! Whole-frame scenarios driven through the backend and the recording device

mod state_scenarios;
