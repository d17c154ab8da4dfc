//! JNI bindings for the Android app.
//!
//! Each public function here corresponds to an `external fun` declaration
//! in NavBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! A navigation session lives on the Rust heap and is referred to from
//! Kotlin by an opaque `Long` handle. `stopNavigation` must be called
//! exactly once per handle.

use jni::JNIEnv;
use jni::objects::{JClass, JString};
use jni::sys::{jboolean, jdouble, jint, jlong, jstring, JNI_FALSE, JNI_TRUE};

use crate::bridge::{self, BridgeSession};
use crate::error::NavError;
use crate::position::PositionSample;

fn throw(env: &mut JNIEnv, err: &NavError) {
    // nothing left to report to if throwing fails
    let _ = env.throw_new("java/lang/IllegalArgumentException", err.to_string());
}

fn to_jstring(env: &mut JNIEnv, result: Result<String, NavError>) -> jstring {
    match result.and_then(|json| Ok(env.new_string(json)?.into_raw())) {
        Ok(s) => s,
        Err(err) => {
            throw(env, &err);
            std::ptr::null_mut()
        }
    }
}

/// Resolve a session handle. `0` (a failed `startNavigation`) is `None`.
///
/// # Safety
/// A non-zero `handle` must come from `startNavigation` and not have
/// been stopped.
unsafe fn session<'a>(handle: jlong) -> Option<&'a mut BridgeSession> {
    (handle as *mut BridgeSession).as_mut()
}

fn throw_no_session(env: &mut JNIEnv) {
    let _ = env.throw_new("java/lang/IllegalStateException", "no navigation session");
}

/// Returns the library version.
/// Maps to: NavBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_safepath_app_NavBridge_version(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    to_jstring(&mut env, Ok(crate::VERSION.to_string()))
}

/// Routes `log` output to logcat. Safe to call more than once.
/// Maps to: NavBridge.init()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_safepath_app_NavBridge_init(
    _env: JNIEnv,
    _class: JClass,
) {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("safepath"),
    );
}

/// Maps to: NavBridge.startNavigation(routeJson: String, configJson: String?) -> Long
/// Returns 0 and throws if the route is unusable.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_safepath_app_NavBridge_startNavigation(
    mut env: JNIEnv,
    _class: JClass,
    route_json: JString,
    config_json: JString,
) -> jlong {
    let route: String = match env.get_string(&route_json) {
        Ok(s) => s.into(),
        Err(_) => return 0,
    };
    let config: Option<String> = if config_json.is_null() {
        None
    } else {
        env.get_string(&config_json).ok().map(Into::into)
    };

    match bridge::start_navigation(&route, config.as_deref()) {
        Ok(session) => Box::into_raw(Box::new(session)) as jlong,
        Err(err) => {
            throw(&mut env, &err);
            0
        }
    }
}

/// Maps to: NavBridge.onPosition(handle, lat, lon, accuracy, timestampMs) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_safepath_app_NavBridge_onPosition(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    latitude: jdouble,
    longitude: jdouble,
    accuracy: jdouble,
    timestamp: jlong,
) -> jstring {
    let Some(session) = (unsafe { session(handle) }) else {
        throw_no_session(&mut env);
        return std::ptr::null_mut();
    };
    let sample = PositionSample {
        latitude,
        longitude,
        accuracy_m: accuracy,
        timestamp: timestamp.max(0) as u64,
    };
    let result = bridge::on_position(session, sample);
    to_jstring(&mut env, result)
}

/// Maps to: NavBridge.onPositionError(handle, code, message) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_safepath_app_NavBridge_onPositionError(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    code: jint,
    message: JString,
) -> jstring {
    let message: String = env
        .get_string(&message)
        .map(Into::into)
        .unwrap_or_default();
    let Some(session) = (unsafe { session(handle) }) else {
        throw_no_session(&mut env);
        return std::ptr::null_mut();
    };
    let result = bridge::on_position_error(session, code, &message);
    to_jstring(&mut env, result)
}

/// Maps to: NavBridge.pollFeedback(handle, nowMs) -> Boolean
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_safepath_app_NavBridge_pollFeedback(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    now_ms: jlong,
) -> jboolean {
    let Some(session) = (unsafe { session(handle) }) else {
        throw_no_session(&mut env);
        return JNI_FALSE;
    };
    if session.poll_feedback(now_ms.max(0) as u64) {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Maps to: NavBridge.stopNavigation(handle)
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_safepath_app_NavBridge_stopNavigation(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if handle == 0 {
        return;
    }
    let mut session = unsafe { Box::from_raw(handle as *mut BridgeSession) };
    session.exit();
}
