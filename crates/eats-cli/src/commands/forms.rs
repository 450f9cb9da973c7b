use crate::support::print_json;
use eats_core::{create_name_forms, index_terms};
use serde_json::json;

pub fn run(name: String, language: Option<String>, script: Option<String>, json_output: bool) {
    let forms = create_name_forms(&name, language.as_deref(), script.as_deref());
    let terms = index_terms(&forms);

    if json_output {
        print_json(&json!({
            "action": "forms",
            "name": name,
            "language": language,
            "script": script,
            "forms": forms,
            "terms": terms,
        }));
    } else {
        println!("eats forms {name:?}");
        println!("  Forms ({}):", forms.len());
        for form in &forms {
            println!("    - {form}");
        }
        println!("  Index terms ({}):", terms.len());
        for term in &terms {
            println!("    - {term}");
        }
    }
}
