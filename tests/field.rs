#[macro_use]
mod common;

#[cfg(test)]
mod field {
    tests! {
        get_set in field is OK
        "thing"
        "other"
    }

    tests! {
        field_shadows_method in field is OK
        "method"
        "field"
    }

    tests! {
        bound_method in field is OK
        "hi ada"
    }

    tests! {
        fields_are_per_instance in field is OK
        "1"
        "2"
    }

    tests! {
        undefined_property in field is ERR(70)
        "Undefined property 'missing'.\n [Line 2]"
    }

    tests! {
        get_on_non_instance in field is ERR(70)
        "Only instances have properties.\n [Line 1]"
    }

    tests! {
        set_on_non_instance in field is ERR(70)
        "Only instances have fields.\n [Line 1]"
    }
}
