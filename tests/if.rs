#[macro_use]
mod common;

#[cfg(test)]
mod _if {
    tests! {
        branches in if is OK
        "then"
        "else"
    }

    tests! {
        dangling_else in if is OK
        "b"
    }

    tests! {
        truthiness in if is OK
        "zero is truthy"
        "empty string is truthy"
        "nil is falsey"
    }
}
