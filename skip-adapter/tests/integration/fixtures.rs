// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use skip_adapter::{
    host::{LocalHost, LocalTestCase},
    skip::{self, SkipRequested},
};
use std::{convert::Infallible, io, sync::Once};

pub(crate) fn test_init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // May already be installed by another harness.
        let _ = color_eyre::install();
    });
}

pub(crate) fn host() -> LocalHost {
    LocalHost::default()
}

pub(crate) fn passing(name: &str) -> LocalTestCase {
    LocalTestCase::new(name.to_owned(), || async { Ok::<_, Infallible>(()) })
}

/// A test that requests a skip by returning the sentinel error.
pub(crate) fn skip_by_error(name: &str, reason: &'static str) -> LocalTestCase {
    LocalTestCase::new(name.to_owned(), move || async move {
        skip::unless(false, reason)?;
        Ok::<_, SkipRequested>(())
    })
}

/// A test that requests a skip by unwinding with the sentinel payload.
pub(crate) fn skip_by_panic(name: &str, reason: &'static str) -> LocalTestCase {
    LocalTestCase::new(name.to_owned(), move || raise_skip(reason))
}

/// A test that requests a skip because a config property is missing.
pub(crate) fn needs_config(name: &str, value: Option<&'static str>) -> LocalTestCase {
    LocalTestCase::new(name.to_owned(), move || async move {
        let server = skip::if_no_config("redis.server", value)?;
        skip::if_missing_feature("streams", !server.is_empty())?;
        Ok::<_, SkipRequested>(())
    })
}

pub(crate) fn failing(name: &str, message: &'static str) -> LocalTestCase {
    LocalTestCase::new(name.to_owned(), move || async move {
        Err::<(), _>(io::Error::other(message))
    })
}

async fn raise_skip(reason: &'static str) -> Result<(), Infallible> {
    skip::inconclusive(reason).raise()
}
