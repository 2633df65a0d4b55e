use ringer_nn::{ActivationFunction, MlpBuilder, Pattern, PatternSet, SynapseBackProp, train_network};
use tracing_subscriber::EnvFilter;

fn main() -> ringer_nn::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut network = MlpBuilder::new(2, vec![2], 1)
        .hidden_activation(ActivationFunction::Tanh)
        .output_activation(ActivationFunction::Tanh)
        .synapse_strategy(SynapseBackProp::new(0.1, 0.5, 1.0)?)
        .weights(ringer_nn::WeightInit::Uniform(0.5))
        .seed(7)
        .build()?;

    let inputs = PatternSet::from_rows(vec![
        vec![1.0, -1.0],
        vec![1.0, 1.0],
        vec![-1.0, 1.0],
        vec![-1.0, -1.0],
    ])?;
    let expected_outputs = PatternSet::from_rows(vec![vec![1.0], vec![-1.0], vec![1.0], vec![-1.0]])?;

    let epochs = 2000;
    for epoch in 0..epochs {
        let loss = train_network(&mut network, &inputs, &expected_outputs)?;
        if epoch % 200 == 0 {
            println!("Epoch {epoch}: loss = {loss:.6}");
        }
    }

    let mut output = Pattern::zeros(1);
    for input in inputs.patterns() {
        network.run(&input, &mut output)?;
        println!("Input: {input} -> Output: {:.4}", output[0]);
    }
    println!("{}", network.to_dot());
    Ok(())
}
