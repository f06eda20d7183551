#[macro_export]
macro_rules! tests {
    ($file:ident in $scope:ident is OK $($expected:literal)*) => {
        #[test]
        fn $file() {
            use rlox_lang::rlox;

            let mut expected = vec![$($expected),*];

            // if exists, concat expected lines with new lines
            let expected = match expected.len() {
                0 => "".to_string(),
                _ => {
                    // add empty string to end to add new line to end of output
                    expected.push("");
                    expected.join("\n")
                }
            };

            let mut output: Vec<u8> = Vec::new();
            let mut rlox = rlox::new(&mut output);

            rlox.run_file(format!("tests/target/{}/{}.lox", stringify!($scope), stringify!($file)));

            // drop rlox here to release the borrow before reading the output
            drop(rlox);
            assert_eq!(expected, std::str::from_utf8(&output).unwrap());
        }
    };

    ($file:ident in $scope:ident is ERR($code:literal) $($expected:literal)+) => {
        #[test]
        fn $file() {
            use assert_cmd::Command;

            // every report starts on a fresh line of its own
            let output: String = vec![$($expected),+]
                .into_iter()
                .map(|chunk: &str| format!("\n{chunk}\n"))
                .collect();
            let file = format!("tests/target/{}/{}.lox", stringify!($scope), stringify!($file));

            Command::cargo_bin("rlox").unwrap()
                .arg(file)
                .assert()
                .stderr(output)
                .code($code);
        }
    };
}
