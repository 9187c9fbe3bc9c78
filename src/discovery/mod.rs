//! RAOP service advertisement (mDNS).

/// Advertises the server's RTSP endpoint as an AirPlay/RAOP service and
/// derives the stable device MAC that feeds both the `Apple-Challenge`
/// response and the service instance name.
pub mod advertiser;

#[cfg(test)]
mod advertiser_tests;
