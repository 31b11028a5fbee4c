use switchboard_core::{is_exported, type_base_name, Error, MethodName};

mod nested {
    pub struct Calc;
    pub struct Wrapper<T>(pub T);
}

#[test]
fn parses_dotted_name() {
    let name: MethodName = "Calc.Add".parse().unwrap();

    assert_eq!(name.service(), "Calc");
    assert_eq!(name.method(), "Add");
    assert_eq!(name.to_string(), "Calc.Add");
    assert_eq!(name, MethodName::new("Calc", "Add"));
}

#[test]
fn rejects_ill_formed_names() {
    for dotted in ["Calc", "Calc.Add.Sub", ".Add", "Calc.", ".", ""] {
        match dotted.parse::<MethodName>() {
            Err(Error::MalformedMethodName(name)) => assert_eq!(name, dotted),
            other => panic!("{dotted:?} parsed as {other:?}"),
        }
    }
}

#[test]
fn malformed_message_quotes_the_name() {
    let err = "CalcAdd".parse::<MethodName>().unwrap_err();

    assert_eq!(
        err.to_string(),
        "rpc: service/method request ill-formed: \"CalcAdd\""
    );
    assert!(err.is_resolution());
    assert!(!err.is_registration());
}

#[test]
fn exported_names_start_upper_case() {
    assert!(is_exported("Calc"));
    assert!(is_exported("Ärger"));
    assert!(!is_exported("calc"));
    assert!(!is_exported("_Calc"));
    assert!(!is_exported(""));
}

#[test]
fn type_base_name_strips_path_and_generics() {
    assert_eq!(type_base_name::<nested::Calc>(), "Calc");
    assert_eq!(type_base_name::<nested::Wrapper<nested::Calc>>(), "Wrapper");
    assert_eq!(type_base_name::<u32>(), "u32");
}

#[test]
fn service_errors_display_verbatim() {
    let err = Error::service("division by zero");

    assert_eq!(err.to_string(), "division by zero");
    assert!(!err.is_registration());
    assert!(!err.is_resolution());
}

#[test]
fn registration_errors_are_classified() {
    assert!(Error::InvalidServiceName(String::new()).is_registration());
    assert!(Error::NoSuitableMethods("Calc".into()).is_registration());
    assert!(Error::DuplicateServiceName("Calc".into()).is_registration());
    assert_eq!(
        Error::DuplicateServiceName("Calc".into()).to_string(),
        "rpc: service already defined: \"Calc\""
    );
}
