use rs_markov_core::model::markov_chain::MarkovChain;
use rs_markov_core::model::predictor::Predictor;
use rs_markov_core::model::state_chain::StateChain;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A predictor with a sliding window of the 2 most recent states
    let mut predictor: Predictor<&str> = Predictor::new(2)?;

    // A zero-sized window can never form a context
    match Predictor::<&str>::new(0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Window of 0 is rejected: {}", e),
    }

    // Observe a repeating session; each observation trains the chain
    // on every suffix of the current history
    let session = ["warm-up", "squat", "deadlift", "plank"];
    for _ in 0..5 {
        for exercise in session {
            predictor.observe(exercise);
        }
    }

    // Exact-context queries on the underlying chain
    let chain = predictor.chain();
    for from in session {
        for to in session {
            let prob = chain.transition_probability(&from, &to);
            if prob > 0.0 {
                println!("{} -> {}: {}", from, to, prob);
            }
        }
    }

    // Raw backoff scores for the current history: one entry per
    // (suffix length, candidate) pair, unaggregated
    let history = predictor.history().clone();
    println!("history: {:?}", history.states());
    for (state, score) in chain.transition_probabilities(&history) {
        if score > 0.0 {
            println!("candidate {}: {}", state, score);
        }
    }

    // Aggregated ranking and a weighted random draw
    for (state, score) in predictor.ranked().iter().take(3) {
        println!("ranked {}: {}", state, score);
    }
    let mut rng = rand::rng();
    if let Some(next) = predictor.sample(&mut rng) {
        println!("sampled next state: {}", next);
    }

    // Batch training builds the same model in parallel
    let observations: Vec<(StateChain<&str>, &str)> = (0..session.len() * 5)
        .map(|i| {
            let previous = StateChain::from_states(vec![
                session[i % session.len()],
                session[(i + 1) % session.len()],
            ]);
            (previous, session[(i + 2) % session.len()])
        })
        .collect();
    let batched = MarkovChain::train_batch(observations)?;
    println!("batch-trained chain has {} contexts", batched.len());

    // Persist and restore the trained model
    let path = std::env::temp_dir().join("sessions.bin");
    let owned: MarkovChain<String> = {
        let mut chain = MarkovChain::new();
        chain.add_transition("a".to_string(), "b".to_string());
        chain
    };
    owned.save_to(&path)?;
    let restored: MarkovChain<String> = MarkovChain::load_from(&path)?;
    println!(
        "restored P(a -> b) = {}",
        restored.transition_probability(&"a".to_string(), &"b".to_string())
    );

    Ok(())
}
