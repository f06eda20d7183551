#[macro_use]
mod common;

#[cfg(test)]
mod closure {
    tests! {
        assign_to_closure in closure is OK
        "outer"
        "changed"
    }

    tests! {
        counter in closure is OK
        "1"
        "2"
    }

    tests! {
        static_scope in closure is OK
        "global"
        "global"
    }

    tests! {
        shared_frame in closure is OK
        "initial"
        "updated"
    }

    tests! {
        close_over_parameter in closure is OK
        "param"
    }
}
