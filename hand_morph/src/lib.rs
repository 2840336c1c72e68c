//! # hand_morph
//!
//! Hand-steered morphing particle cloud: a swarm of particles forms a heart,
//! a rose, a ringed planet, a seated figure, a burst sphere or a digit glyph,
//! and one tracked hand drags, scales and rolls the whole cloud in real time.
//!
//! ## Gesture → shape mapping
//!
//! | Gesture held still | Shape shown |
//! |---|---|
//! | 1–4 fingers | Digit glyph `1`–`4` |
//! | Open palm (5) | The user's picked shape |
//! | Fist (0) | No change |
//!
//! A gesture only lands after the hand stays still for the hold window, so
//! waving past a count never switches shapes by accident.
//!
//! ## Landmark sources
//!
//! * (default) **Simulation** — mouse and keyboard drive a synthetic hand
//!   whose landmark frames run through the very same extraction path as real
//!   tracking.
//! * `--tracker CMD` — an external tracker process prints `READY`, then one
//!   JSON landmark frame per stdout line.
//!
//! ## Window controls
//!
//! | Input | Effect |
//! |---|---|
//! | `1`–`5` | Pick heart / rose / planet / figure / burst |
//! | `C` | Cycle the base color |
//! | Mouse move | Move the simulated hand |
//! | Scroll | Pinch in / out |
//! | `Q` / `E` | Roll the simulated hand |
//! | `F1`–`F5` | Hold up 1–5 fingers |
//! | `G` | Make a fist |
//! | `Space` | Hand in / out of view |
//! | `Esc` | Quit |

pub mod app;
pub mod config;
pub mod logging;
pub mod source;
pub mod visualizer;
