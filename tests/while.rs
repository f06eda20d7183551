#[macro_use]
mod common;

#[cfg(test)]
mod _while {
    tests! {
        countdown in while is OK
        "3"
        "2"
        "1"
    }

    tests! {
        false_condition in while is OK
        "done"
    }

    tests! {
        break_continue in while is OK
        "1"
        "2"
        "4"
    }
}
