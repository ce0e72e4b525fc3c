use super::*;

fn registry(name: &str, version: Option<&str>) -> Specifier {
    Specifier::Registry {
        name: name.to_string(),
        version: version.map(ToOwned::to_owned),
    }
}

#[test]
fn unscoped_forms() {
    assert_eq!(Specifier::parse("lodash").expect("parse"), registry("lodash", None));
    assert_eq!(
        Specifier::parse("lodash@4.17.21").expect("parse"),
        registry("lodash", Some("4.17.21"))
    );
}

#[test]
fn scoped_forms_split_at_last_at() {
    assert_eq!(
        Specifier::parse("@babel/core").expect("parse"),
        registry("@babel/core", None)
    );
    assert_eq!(
        Specifier::parse("@babel/core@7.24.0").expect("parse"),
        registry("@babel/core", Some("7.24.0"))
    );
}

#[test]
fn local_paths() {
    assert_eq!(
        Specifier::parse("./pkg.tgz").expect("parse"),
        Specifier::Local(PathBuf::from("./pkg.tgz"))
    );
    assert_eq!(
        Specifier::parse("../dir/pkg.tar.gz").expect("parse"),
        Specifier::Local(PathBuf::from("../dir/pkg.tar.gz"))
    );
    assert_eq!(
        Specifier::parse("/abs/path").expect("parse"),
        Specifier::Local(PathBuf::from("/abs/path"))
    );
    assert_eq!(
        Specifier::parse("relative-name.tgz").expect("parse"),
        Specifier::Local(PathBuf::from("relative-name.tgz"))
    );
}

#[test]
fn rejects_bad_input() {
    assert!(Specifier::parse("").is_err());
    assert!(Specifier::parse("   ").is_err());
    assert!(Specifier::parse("lodash@").is_err());
    assert!(Specifier::parse("@scope").is_err());
}
