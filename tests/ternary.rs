#[macro_use]
mod common;

#[cfg(test)]
mod ternary {
    tests! {
        basic in ternary is OK
        "yes"
        "no"
    }

    tests! {
        nested in ternary is OK
        "both"
    }

    tests! {
        any_result in ternary is OK
        "false"
        "nil"
        "true"
    }

    tests! {
        lazy in ternary is OK
        "untouched"
    }

    tests! {
        comma_binds_looser in ternary is OK
        "second"
    }
}
