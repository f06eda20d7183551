#[macro_use]
mod common;

#[cfg(test)]
mod _return {
    tests! {
        in_while in return is OK
        "3"
    }

    tests! {
        after_else in return is OK
        "no"
    }

    tests! {
        no_value in return is OK
        "nil"
    }
}
