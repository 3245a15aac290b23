//! Fuzz target: boot-state restoration from storage
//!
//! Writes arbitrary bytes into the state slot and checks that:
//! - No panics under any stored blob
//! - The restored state is never a transient one (ARMING, MOTION-DETECTED)
//! - Only a recognised single byte restores anything other than OFF
//!
//! cargo fuzz run fuzz_persisted_state

#![no_main]

use homealarm::adapters::nvs::NvsAdapter;
use homealarm::app::ports::StoragePort;
use homealarm::app::service::AppService;
use homealarm::fsm::StateId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    if nvs.write("alarm", "state", data).is_err() {
        return;
    }

    let restored = AppService::restored_state(&nvs);
    assert!(!matches!(restored, StateId::Arming | StateId::MotionDetected));

    let recognised = data.len() == 1 && StateId::from_u8(data[0]).is_some();
    if !recognised {
        assert_eq!(restored, StateId::Off);
    }
});
