#[macro_use]
mod common;

#[cfg(test)]
mod _continue {
    tests! {
        skip_iteration in continue is OK
        "1"
        "3"
        "4"
        "5"
    }

    tests! {
        no_loop in continue is ERR(65)
        "[line 1] Error at 'continue': Cannot continue outside of a loop."
    }
}
