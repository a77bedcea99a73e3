pub mod autocorr;
pub mod contour;
pub mod pitch;
pub mod smoothing;
pub mod windowing;
