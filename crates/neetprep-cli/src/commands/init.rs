//! The `neetprep init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("neetprep.toml").exists() {
        println!("neetprep.toml already exists, skipping.");
    } else {
        std::fs::write("neetprep.toml", SAMPLE_CONFIG)?;
        println!("Created neetprep.toml");
    }

    std::fs::create_dir_all("neetprep-data")?;
    let bank_path = Path::new("neetprep-data/bank.json");
    if bank_path.exists() {
        println!("neetprep-data/bank.json already exists, skipping.");
    } else {
        std::fs::write(bank_path, SAMPLE_BANK)?;
        println!("Created neetprep-data/bank.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit neetprep.toml to point at your question bank");
    println!("  2. Run: neetprep chapters --subject physics");
    println!("  3. Run: neetprep take --subject physics --chapter kinetics --mode easy");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# neetprep configuration

user_id = "local"
weak_threshold = 50.0
group_question_count = 20
output_dir = "./neetprep-results"

[store]
type = "file"
root = "./neetprep-data"

# To use a Firebase Realtime Database instead:
# [store]
# type = "firebase"
# database_url = "https://your-project.firebaseio.com"
# auth_token = "${NEETPREP_AUTH_TOKEN}"
"#;

const SAMPLE_BANK: &str = r#"{
  "physics": {
    "kinetics": {
      "questions": {
        "q1": {
          "question": "A body moving with uniform velocity has an acceleration of",
          "options": { "a": "zero", "b": "constant and non-zero", "c": "increasing", "d": "decreasing" },
          "correct": "a",
          "explanation": "Uniform velocity means the velocity does not change, so the acceleration is zero."
        },
        "q2": {
          "question": "The SI unit of linear momentum is",
          "options": { "a": "kg m/s^2", "b": "kg m/s", "c": "N/s", "d": "J s" },
          "correct": "b",
          "explanation": "Momentum is mass times velocity, so its unit is kg m/s."
        },
        "q3": {
          "question": "The slope of a velocity-time graph gives",
          "options": { "a": "displacement", "b": "speed", "c": "acceleration", "d": "jerk" },
          "correct": "c",
          "explanation": "Acceleration is the rate of change of velocity, which is the slope of the v-t graph."
        }
      }
    },
    "optics": {
      "questions": {
        "q1": {
          "question": "The power of a convex lens of focal length 50 cm is",
          "options": { "a": "0.5 D", "b": "2 D", "c": "5 D", "d": "50 D" },
          "correct": "b",
          "explanation": "P = 1/f in metres, so 1/0.5 m = 2 D."
        },
        "q2": {
          "question": "Which colour of white light deviates least through a prism?",
          "options": { "a": "violet", "b": "blue", "c": "green", "d": "red" },
          "correct": "d",
          "explanation": "Red light has the longest wavelength and the smallest refractive index, so it deviates least."
        }
      }
    }
  },
  "chemistry": {
    "atomic-structure": {
      "questions": {
        "q1": {
          "question": "The maximum number of electrons in the shell with n = 3 is",
          "options": { "a": "8", "b": "18", "c": "32", "d": "9" },
          "correct": "b",
          "explanation": "A shell holds at most 2n^2 electrons, and 2 x 3^2 = 18."
        },
        "q2": {
          "question": "The quantum number l is called the",
          "options": { "a": "principal quantum number", "b": "azimuthal quantum number", "c": "magnetic quantum number", "d": "spin quantum number" },
          "correct": "b",
          "explanation": "l is the azimuthal (orbital angular momentum) quantum number and fixes the subshell."
        }
      }
    }
  }
}
"#;
